//! Bounded reputation arithmetic
//!
//! Reputation always stays within `[MIN_REPUTATION, MAX_REPUTATION]`.

use crate::constants::{
    INITIAL_REPUTATION, MAX_REPUTATION, MAX_REPUTATION_BONUS, MAX_SLASH_COUNT, MIN_REPUTATION,
    REPUTATION_GAIN_WIN, REPUTATION_LOSS_FAIL, SCALE, SLASH_RATE,
};
use crate::error::{ArithmeticError, Result};
use crate::fixed::{mul_div, sub};
use crate::types::{ParticipantInfo, ParticipantId, ParticipantRecord};

impl ParticipantRecord {
    /// Fresh record at the initial reputation
    pub fn new() -> Self {
        Self {
            reputation: INITIAL_REPUTATION,
            contributions: 0,
            successes: 0,
            stake_amount: 0,
            slash_count: 0,
            stake_locked_until: 0,
            stake_role: None,
        }
    }

    /// `successes * SCALE / contributions`, zero with no contributions
    pub fn success_rate(&self) -> u64 {
        if self.contributions == 0 {
            return 0;
        }
        mul_div(self.successes, SCALE, self.contributions).unwrap_or(0)
    }

    pub fn info(&self, participant: &ParticipantId) -> ParticipantInfo {
        ParticipantInfo {
            participant: participant.clone(),
            reputation: self.reputation,
            contributions: self.contributions,
            successes: self.successes,
            stake_amount: self.stake_amount,
            slash_count: self.slash_count,
            stake_locked_until: self.stake_locked_until,
        }
    }
}

impl Default for ParticipantRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Reputation after a win, capped at `MAX_REPUTATION`
pub fn after_win(reputation: u64) -> u64 {
    reputation.saturating_add(REPUTATION_GAIN_WIN).min(MAX_REPUTATION)
}

/// Reputation after a failure, floored at `MIN_REPUTATION`
pub fn after_loss(reputation: u64) -> u64 {
    reputation.saturating_sub(REPUTATION_LOSS_FAIL).max(MIN_REPUTATION)
}

/// `floor(base * reputation * 20% / SCALE²)`
pub fn bonus(base: u64, reputation: u64) -> Result<u64> {
    let numerator = (base as u128)
        .checked_mul(reputation as u128)
        .and_then(|v| v.checked_mul(MAX_REPUTATION_BONUS as u128))
        .ok_or(ArithmeticError::Overflow)?;
    let bonus = numerator / (SCALE as u128 * SCALE as u128);
    Ok(u64::try_from(bonus).map_err(|_| ArithmeticError::Overflow)?)
}

/// Stake and slash count after one slash
pub fn slash(stake: u64, slash_count: u32) -> Result<(u64, u32, u64)> {
    let penalty = mul_div(stake, SLASH_RATE, SCALE)?;
    let slash_count = slash_count.saturating_add(1);
    let remaining = if slash_count >= MAX_SLASH_COUNT {
        0
    } else {
        sub(stake, penalty)?
    };
    Ok((remaining, slash_count, stake - remaining))
}
