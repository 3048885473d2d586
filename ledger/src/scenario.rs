//! Scenario replay
//!
//! A scenario is a YAML list of ledger actions replayed in order against a
//! [`LedgerHandle`]. Bets, shares and stakes are referred to by the ids the
//! ledger hands out, so a scenario reads like the calls a host would make.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, Result};
use crate::ledger::LedgerSnapshot;
use crate::report::{PriceFields, ReportSink, SettlementReport};
use crate::service::LedgerHandle;
use crate::types::{
    BetId, Category, FeedPayload, Model, ParticipantId, PredictionId, Role, ShareId, Signal,
    StakeRecord,
};

/// A named sequence of ledger actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Asset symbol stamped on every report
    pub symbol: String,

    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Deposit {
        owner: ParticipantId,
        amount: u64,
    },
    Withdraw {
        share: ShareId,
    },
    Stake {
        owner: ParticipantId,
        role: Role,
        amount: u64,
        now: u64,
    },
    WithdrawStake {
        owner: ParticipantId,
        now: u64,
    },
    Predict {
        feed: FeedPayload,
        model: Model,
        target_category: Category,
        target_value: u64,
        threshold: u64,
        now: u64,
        #[serde(default)]
        prices: PriceFields,
    },
    Settle {
        bet: BetId,
        actual_value: u64,
        data_provider: ParticipantId,
        model_creator: ParticipantId,
        prediction_id: PredictionId,
    },
    Cancel {
        bet: BetId,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Deposit { .. } => "deposit",
            Step::Withdraw { .. } => "withdraw",
            Step::Stake { .. } => "stake",
            Step::WithdrawStake { .. } => "withdraw_stake",
            Step::Predict { .. } => "predict",
            Step::Settle { .. } => "settle",
            Step::Cancel { .. } => "cancel",
        }
    }
}

impl Scenario {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// Counters for one replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
    pub reports: usize,
    pub snapshot: LedgerSnapshot,
}

/// What a placed bet needs to produce its report later
struct OpenPrediction {
    signal: Signal,
    quality_score: u64,
    prices: PriceFields,
}

/// Replay `scenario` step by step
///
/// Routine rejections are logged and counted. Fatal accounting errors and a
/// closed service abort the replay.
pub async fn replay(
    scenario: &Scenario,
    handle: &LedgerHandle,
    sink: &dyn ReportSink,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    let mut predictions: HashMap<BetId, OpenPrediction> = HashMap::new();
    let mut stakes: HashMap<ParticipantId, StakeRecord> = HashMap::new();

    info!(symbol = %scenario.symbol, steps = scenario.steps.len(), sink = sink.name(), "Replaying scenario");

    for (index, step) in scenario.steps.iter().enumerate() {
        let result = apply(scenario, step, handle, sink, &mut predictions, &mut stakes).await;

        match result {
            Ok(reported) => {
                summary.applied += 1;
                if reported {
                    summary.reports += 1;
                }
                debug!(index, step = step.name(), "Step applied");
            }
            Err(e) if e.is_fatal() || e.is_retryable() => return Err(e),
            Err(e) => {
                summary.rejected += 1;
                warn!(index, step = step.name(), error = %e, category = e.category(), "Step rejected");
            }
        }
    }

    sink.flush().await?;
    summary.snapshot = handle.snapshot();

    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        reports = summary.reports,
        "Scenario complete"
    );
    Ok(summary)
}

/// Apply one step; returns whether a report was produced
async fn apply(
    scenario: &Scenario,
    step: &Step,
    handle: &LedgerHandle,
    sink: &dyn ReportSink,
    predictions: &mut HashMap<BetId, OpenPrediction>,
    stakes: &mut HashMap<ParticipantId, StakeRecord>,
) -> Result<bool> {
    match step {
        Step::Deposit { owner, amount } => {
            let receipt = handle.deposit(owner.clone(), *amount).await?;
            info!(%owner, share_id = %receipt.share_id, shares = receipt.shares, "Deposit");
        }
        Step::Withdraw { share } => {
            let payout = handle.withdraw(*share).await?;
            info!(share_id = %share, payout, "Withdrawal");
        }
        Step::Stake {
            owner,
            role,
            amount,
            now,
        } => {
            let record = handle
                .deposit_stake(*amount, *role, owner.clone(), *now)
                .await?;
            stakes.insert(owner.clone(), record);
        }
        Step::WithdrawStake { owner, now } => {
            let record = stakes
                .get(owner)
                .cloned()
                .ok_or_else(|| LedgerError::UnknownStake(owner.clone()))?;
            let payout = handle.withdraw_stake(record, *now).await?;
            stakes.remove(owner);
            info!(%owner, payout, "Stake released");
        }
        Step::Predict {
            feed,
            model,
            target_category,
            target_value,
            threshold,
            now,
            prices,
        } => {
            let (prediction, position) = handle
                .predict_and_bet(
                    *feed,
                    model.clone(),
                    *target_category,
                    *target_value,
                    *threshold,
                    *now,
                )
                .await?;
            info!(
                bet_id = %position.id,
                amount = position.amount,
                confidence = prediction.signal.confidence,
                direction = prediction.signal.direction,
                "Prediction placed"
            );
            predictions.insert(
                position.id,
                OpenPrediction {
                    signal: prediction.signal,
                    quality_score: feed.quality_score,
                    prices: *prices,
                },
            );
        }
        Step::Settle {
            bet,
            actual_value,
            data_provider,
            model_creator,
            prediction_id,
        } => {
            let outcome = handle
                .settle_prediction(
                    *bet,
                    *actual_value,
                    data_provider.clone(),
                    model_creator.clone(),
                    *prediction_id,
                )
                .await?;

            if let Some(open) = predictions.remove(bet) {
                let report = SettlementReport::new(
                    handle.market(),
                    scenario.symbol.clone(),
                    open.prices,
                    open.quality_score,
                    &open.signal,
                    outcome,
                    &handle.snapshot(),
                );
                sink.submit(&report).await?;
                return Ok(true);
            }
        }
        Step::Cancel { bet } => {
            let refund = handle.cancel_bet(*bet).await?;
            predictions.remove(bet);
            info!(bet_id = %bet, refund, "Bet cancelled");
        }
    }

    Ok(false)
}
