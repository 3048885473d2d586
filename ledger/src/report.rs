//! Settlement reports for the downstream submitter
//!
//! A report bundles everything the submitter signs for one settled
//! prediction. Signing and submission happen outside this crate.

use std::io::Write;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::{ReportConfig, SinkKind};
use crate::error::Result;
use crate::ledger::{LedgerSnapshot, SettlementOutcome};
use crate::types::{MarketId, ParticipantInfo, PoolStats, Signal};

/// Normalized price fields from the feeder (fixed-point)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFields {
    pub open: u64,
    pub high: u64,
    pub low: u64,
    pub close: u64,
}

/// One settled prediction, ready for signing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub report_id: Uuid,
    pub market_id: MarketId,
    pub symbol: String,
    pub prices: PriceFields,
    pub quality_score: u64,
    pub direction: bool,
    pub confidence: u64,
    pub outcome: SettlementOutcome,
    pub pool: PoolStats,
    pub participants: Vec<ParticipantInfo>,
    pub generated_at: DateTime<Utc>,
}

impl SettlementReport {
    pub fn new(
        market_id: MarketId,
        symbol: impl Into<String>,
        prices: PriceFields,
        quality_score: u64,
        signal: &Signal,
        outcome: SettlementOutcome,
        snapshot: &LedgerSnapshot,
    ) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            market_id,
            symbol: symbol.into(),
            prices,
            quality_score,
            direction: signal.direction,
            confidence: signal.confidence,
            outcome,
            pool: snapshot.pool.clone(),
            participants: snapshot.participants.clone(),
            generated_at: Utc::now(),
        }
    }
}

/// Destination for settlement reports
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Get the name of this sink
    fn name(&self) -> &'static str;

    /// Hand one report downstream
    async fn submit(&self, report: &SettlementReport) -> Result<()>;

    /// Flush any buffered reports
    async fn flush(&self) -> Result<()>;
}

/// Emits each report as a structured `tracing` event
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn submit(&self, report: &SettlementReport) -> Result<()> {
        let outcome = serde_json::to_string(&report.outcome)?;
        info!(
            report_id = %report.report_id,
            market = %report.market_id,
            symbol = %report.symbol,
            close = report.prices.close,
            quality_score = report.quality_score,
            direction = report.direction,
            confidence = report.confidence,
            total_liquidity = report.pool.total_liquidity,
            %outcome,
            "Settlement report"
        );
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Writes reports as JSON lines into any writer
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
    pretty: bool,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            pretty,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: Write + Send> ReportSink for WriterSink<W> {
    fn name(&self) -> &'static str {
        "writer"
    }

    async fn submit(&self, report: &SettlementReport) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };

        let mut writer = self.writer.lock();
        writeln!(writer, "{}", json)?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

/// Build the sink selected in configuration
pub fn sink_from_config(config: &ReportConfig) -> Box<dyn ReportSink> {
    match config.sink {
        SinkKind::Log => Box::new(LogSink),
        SinkKind::Stdout => Box::new(WriterSink::new(std::io::stdout(), config.pretty)),
    }
}
