//! Error types for the oracle ledger

use thiserror::Error;

use crate::types::{BetId, ParticipantId, Role, ShareId};

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures of the fixed-point kernel
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("fixed-point overflow")]
    Overflow,

    #[error("fixed-point underflow")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,
}

/// Every way a ledger transition can be rejected.
///
/// A returned error always means the ledger was left untouched.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    // Inference
    #[error("Category mismatch: data={data}, model={model}")]
    CategoryMismatch { data: u32, model: u32 },

    // Feeder boundary
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    // Pool
    #[error("Deposit too small: amount={amount}, minimum={minimum}")]
    DepositTooSmall { amount: u64, minimum: u64 },

    #[error("Unknown share record: {0}")]
    UnknownShare(ShareId),

    #[error("Pool is empty")]
    PoolEmpty,

    #[error("Deposit mints no shares: amount={amount}, share_value={share_value}")]
    NoSharesMinted { amount: u64, share_value: u64 },

    #[error("Insufficient liquidity: required={required}, available={available}")]
    InsufficientLiquidity { required: u64, available: u64 },

    // Betting
    #[error("Pool has no liquidity")]
    NoLiquidity,

    #[error("Exposure cap reached: exposure={exposure}, cap={cap}")]
    ExposureCapReached { exposure: u64, cap: u64 },

    #[error("Confidence too low: confidence={confidence}, minimum={minimum}")]
    LowConfidence { confidence: u64, minimum: u64 },

    #[error("Insufficient room under exposure cap: available={available}, required={required}")]
    InsufficientRoom { available: u64, required: u64 },

    #[error("Bet too small: amount={amount}, minimum={minimum}")]
    BetTooSmall { amount: u64, minimum: u64 },

    #[error("Unknown bet: {0}")]
    UnknownBet(BetId),

    #[error("Bet {0} already settled")]
    AlreadySettled(BetId),

    // Staking
    #[error("Stake too small: amount={amount}, minimum={minimum}")]
    StakeTooSmall { amount: u64, minimum: u64 },

    #[error("Role {0:?} cannot stake")]
    InvalidStakeRole(Role),

    #[error("Stake still locked: now={now}, locked_until={locked_until}")]
    StakeStillLocked { now: u64, locked_until: u64 },

    #[error("No stake held by {0}")]
    UnknownStake(ParticipantId),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // Host
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl LedgerError {
    /// Create an invalid payload error
    pub fn invalid_payload<S: Into<String>>(message: S) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant<S: Into<String>>(message: S) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Check if this error is retryable
    ///
    /// Ledger rejections are deterministic, so only a dropped actor qualifies.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ServiceUnavailable(_))
    }

    /// Accounting defects that must alert rather than be treated as routine rejections
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::InsufficientLiquidity { .. } | LedgerError::InvariantViolation(_)
        )
    }

    /// Get the owning component for metrics and logs
    pub fn category(&self) -> &'static str {
        match self {
            LedgerError::Arithmetic(_) => "kernel",
            LedgerError::CategoryMismatch { .. } => "inference",
            LedgerError::InvalidPayload { .. } => "feed",
            LedgerError::DepositTooSmall { .. }
            | LedgerError::UnknownShare(_)
            | LedgerError::PoolEmpty
            | LedgerError::NoSharesMinted { .. }
            | LedgerError::InsufficientLiquidity { .. } => "pool",
            LedgerError::NoLiquidity
            | LedgerError::ExposureCapReached { .. }
            | LedgerError::LowConfidence { .. }
            | LedgerError::InsufficientRoom { .. }
            | LedgerError::BetTooSmall { .. }
            | LedgerError::UnknownBet(_)
            | LedgerError::AlreadySettled(_) => "betting",
            LedgerError::StakeTooSmall { .. }
            | LedgerError::InvalidStakeRole(_)
            | LedgerError::StakeStillLocked { .. }
            | LedgerError::UnknownStake(_) => "staking",
            LedgerError::InvariantViolation(_) => "invariant",
            LedgerError::Config(_) => "config",
            LedgerError::Serialization(_) | LedgerError::Yaml(_) => "serialization",
            LedgerError::Io(_) => "io",
            LedgerError::ServiceUnavailable(_) => "service",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_errors_convert() {
        let err: LedgerError = ArithmeticError::Underflow.into();
        assert!(matches!(err, LedgerError::Arithmetic(ArithmeticError::Underflow)));
        assert_eq!(err.category(), "kernel");
    }

    #[test]
    fn test_fatal_and_retryable() {
        let loss = LedgerError::InsufficientLiquidity { required: 10, available: 5 };
        assert!(loss.is_fatal());
        assert!(!loss.is_retryable());

        let gone = LedgerError::service_unavailable("actor stopped");
        assert!(gone.is_retryable());
        assert!(!gone.is_fatal());

        assert!(!LedgerError::PoolEmpty.is_fatal());
    }

    #[test]
    fn test_categories() {
        let dust = LedgerError::NoSharesMinted { amount: 1_000_000, share_value: 2_000_000 };
        assert_eq!(dust.category(), "pool");
        assert!(!dust.is_fatal());

        let missing = LedgerError::UnknownStake(ParticipantId::new("feeder"));
        assert_eq!(missing.category(), "staking");
        assert_eq!(missing.to_string(), "No stake held by feeder");
        assert!(!missing.is_retryable());
    }
}
