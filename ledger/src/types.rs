//! Core types for the oracle ledger

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::SCALE;
use crate::error::{LedgerError, Result};

/// Liquidity share record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareId(pub u64);

/// Bet position identifier, allocated monotonically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetId(pub u64);

/// Prediction identifier linking a distribution to the call that earned it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionId(pub u64);

/// Data/model category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub u32);

/// Identity of a data provider, model creator or liquidity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

/// Identifier of one independent ledger instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(pub Uuid);

impl ParticipantId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl MarketId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MarketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "share#{}", self.0)
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bet#{}", self.0)
    }
}

impl fmt::Display for PredictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prediction#{}", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scoring algorithm selected by a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Linear,
    Logistic,
    Tree,
}

impl Algorithm {
    /// Registry algorithm id (1 = linear, 2 = logistic, 3 = tree)
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Algorithm::Linear),
            2 => Some(Algorithm::Logistic),
            3 => Some(Algorithm::Tree),
            _ => None,
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            Algorithm::Linear => 1,
            Algorithm::Logistic => 2,
            Algorithm::Tree => 3,
        }
    }
}

/// Role a participant plays in a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    DataProvider,
    ModelCreator,
    Pool,
}

impl Role {
    pub fn code(&self) -> u8 {
        match self {
            Role::DataProvider => 0,
            Role::ModelCreator => 1,
            Role::Pool => 2,
        }
    }
}

/// Normalized payload handed over by the data feeder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPayload {
    /// Normalized value (fixed-point)
    pub payload: u64,

    /// Quality score in `[0, SCALE]`
    pub quality_score: u64,

    pub category: Category,
}

impl FeedPayload {
    pub fn new(payload: u64, quality_score: u64, category: Category) -> Result<Self> {
        let feed = Self {
            payload,
            quality_score,
            category,
        };
        feed.validate()?;
        Ok(feed)
    }

    /// Reject quality scores outside `[0, SCALE]` and payloads that cannot be scored
    pub fn validate(&self) -> Result<()> {
        if self.quality_score > SCALE {
            return Err(LedgerError::invalid_payload(format!(
                "quality score {} exceeds {}",
                self.quality_score, SCALE
            )));
        }
        if self.payload > i64::MAX as u64 {
            return Err(LedgerError::invalid_payload(format!(
                "payload {} out of range",
                self.payload
            )));
        }
        Ok(())
    }
}

/// Trained scoring model, read-only here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Feature weights, or the three split thresholds for a tree
    pub weights: [i64; 4],
    pub bias: i64,
    pub threshold: i64,
    pub category: Category,
    pub algorithm: Algorithm,
}

/// Directional call produced by inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub score: i64,

    /// Confidence in `[0, SCALE]`
    pub confidence: u64,

    pub category: Category,

    /// `true` for an upward call
    pub direction: bool,
}

/// One outstanding deposit into the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub id: ShareId,
    pub owner: ParticipantId,
    pub shares: u64,
}

/// Receipt returned by a deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub share_id: ShareId,
    pub shares: u64,

    /// Per-share value right after the deposit (fixed-point)
    pub share_value: u64,
}

/// An open or terminal bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetPosition {
    pub id: BetId,
    pub signal: Signal,
    pub amount: u64,
    pub target_category: Category,
    pub target_value: u64,
    pub threshold: u64,

    /// Caller-supplied time of placement
    pub placed_at: u64,

    pub settled: bool,
}

/// Result of settling a bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetSettlement {
    pub bet_id: BetId,
    pub amount: u64,
    pub is_win: bool,
}

/// Per-participant reputation, activity and collateral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub reputation: u64,
    pub contributions: u64,
    pub successes: u64,
    pub stake_amount: u64,
    pub slash_count: u32,
    pub stake_locked_until: u64,

    /// Role of the most recent stake deposit
    pub stake_role: Option<Role>,
}

/// One payout line of a profit distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitShare {
    pub owner: ParticipantId,
    pub amount: u64,
    pub role: Role,
    pub prediction_id: PredictionId,
    pub reputation_bonus: u64,
}

/// Output of `distribute_profit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub data_share: ProfitShare,
    pub model_share: ProfitShare,
    pub pool_share: u64,
}

impl Distribution {
    /// Sum of all three legs; always equals the distributed profit
    pub fn total(&self) -> u64 {
        self.data_share.amount + self.model_share.amount + self.pool_share
    }
}

/// Receipt returned by a stake deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub owner: ParticipantId,

    /// Amount added by this deposit
    pub amount: u64,

    pub role: Role,
    pub locked_until: u64,
    pub slash_count: u32,
}

/// Pool totals plus derived values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_liquidity: u64,
    pub total_shares: u64,
    pub total_bets: u64,
    pub total_profit: u64,
    pub total_loss: u64,

    /// Per-share value (fixed-point)
    pub share_value: u64,

    pub net_profit: i128,
}

/// Betting engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetStats {
    pub total_placed: u64,
    pub total_settled: u64,
    pub active_bets: u64,
    pub total_profit: u64,
    pub total_loss: u64,
    pub current_exposure: u64,
    pub win_count: u64,
    pub loss_count: u64,
}

/// System-wide distribution aggregates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub total_distributions: u64,
    pub total_profit_distributed: u64,
    pub total_data_provider_paid: u64,
    pub total_model_creator_paid: u64,
    pub total_pool_allocated: u64,
}

/// Read-only participant view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub participant: ParticipantId,
    pub reputation: u64,
    pub contributions: u64,
    pub successes: u64,
    pub stake_amount: u64,
    pub slash_count: u32,
    pub stake_locked_until: u64,
}
