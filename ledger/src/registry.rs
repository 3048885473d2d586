//! Registry of independent markets
//!
//! Each market owns its own ledger service, so markets progress in parallel
//! while every single market stays strictly serialized.

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::ledger::{Ledger, LedgerSnapshot};
use crate::service::{LedgerHandle, LedgerService};
use crate::types::MarketId;

struct MarketEntry {
    handle: LedgerHandle,
    task: JoinHandle<Ledger>,
}

/// Concurrent `MarketId -> LedgerHandle` map
pub struct MarketRegistry {
    markets: DashMap<MarketId, MarketEntry>,
    channel_capacity: usize,
}

impl MarketRegistry {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            markets: DashMap::new(),
            channel_capacity,
        }
    }

    /// Start a fresh ledger under a new market id
    pub fn open_market(&self) -> LedgerHandle {
        self.open_with(MarketId::new(), Ledger::new())
    }

    /// Start a service for an existing ledger; replaces nothing if `market` is taken
    pub fn open_with(&self, market: MarketId, ledger: Ledger) -> LedgerHandle {
        self.markets
            .entry(market)
            .or_insert_with(|| {
                let (handle, task) = LedgerService::spawn(market, ledger, self.channel_capacity);
                info!(%market, "Market opened");
                MarketEntry { handle, task }
            })
            .handle
            .clone()
    }

    pub fn get(&self, market: &MarketId) -> Option<LedgerHandle> {
        self.markets.get(market).map(|entry| entry.handle.clone())
    }

    pub fn markets(&self) -> Vec<MarketId> {
        self.markets.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Latest published snapshot of every market
    pub fn snapshots(&self) -> Vec<(MarketId, LedgerSnapshot)> {
        self.markets
            .iter()
            .map(|entry| (*entry.key(), entry.handle.snapshot()))
            .collect()
    }

    /// Drain a market's queue, stop its service and return the final ledger
    pub async fn close_market(&self, market: &MarketId) -> Result<Ledger> {
        let (_, entry) = self
            .markets
            .remove(market)
            .ok_or_else(|| LedgerError::service_unavailable(format!("unknown market {}", market)))?;

        entry.handle.shutdown().await?;
        let ledger = entry.task.await.map_err(|e| {
            LedgerError::service_unavailable(format!("market {} task failed: {}", market, e))
        })?;

        info!(%market, "Market closed");
        Ok(ledger)
    }
}

impl Default for MarketRegistry {
    fn default() -> Self {
        Self::new(1024)
    }
}
