//! Protocol constants shared by every replica.
//!
//! All values are fixed-point with `SCALE` meaning 1.0.

pub const SCALE: u64 = 1_000_000;
pub const ONE: u64 = SCALE;
pub const HALF: u64 = 500_000;

// Inference
pub const SIGMOID_SATURATION: i64 = 6_000_000;
pub const SIGMOID_SLOPE_DIVISOR: i64 = 12;
pub const TREE_LEAF_CONFIDENCE: [u64; 4] = [800_000, 600_000, 700_000, 900_000];

// Liquidity pool
pub const MIN_DEPOSIT: u64 = 1_000_000;

// Betting
pub const MAX_POOL_EXPOSURE_PERCENT: u64 = 10;
pub const MIN_BET: u64 = 1_000_000;
pub const MAX_BET_MULTIPLIER: u64 = 5;
pub const MIN_CONFIDENCE: u64 = 600_000;

// Profit distribution
pub const DATA_PROVIDER_SHARE: u64 = 400_000;
pub const MODEL_CREATOR_SHARE: u64 = 400_000;
pub const POOL_SHARE: u64 = 200_000;

// Reputation
pub const MIN_REPUTATION: u64 = 0;
pub const MAX_REPUTATION: u64 = SCALE;
pub const INITIAL_REPUTATION: u64 = 500_000;
pub const MAX_REPUTATION_BONUS: u64 = 200_000;
pub const REPUTATION_GAIN_WIN: u64 = 50_000;
pub const REPUTATION_LOSS_FAIL: u64 = 100_000;

// Staking
pub const MIN_STAKE: u64 = 10_000_000;
/// Lock length in caller-supplied time units (block heights).
pub const STAKE_LOCK_PERIOD: u64 = 86_400;
pub const SLASH_RATE: u64 = 100_000;
pub const MAX_SLASH_COUNT: u32 = 10;
