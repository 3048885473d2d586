//! Time-locked stake collateral
//!
//! Lock expiry is measured against the caller's `now`, never a local clock.

use tracing::info;

use super::ProfitDistributor;
use crate::constants::{MIN_STAKE, STAKE_LOCK_PERIOD};
use crate::error::{LedgerError, Result};
use crate::fixed::add;
use crate::types::{ParticipantId, Role, StakeRecord};

impl ProfitDistributor {
    /// Lock `amount` of collateral for `owner` acting as `role`
    ///
    /// Stakes accumulate. Each deposit restarts the lock and clears the slash count.
    pub fn deposit_stake(
        &mut self,
        amount: u64,
        role: Role,
        owner: &ParticipantId,
        now: u64,
    ) -> Result<StakeRecord> {
        if amount < MIN_STAKE {
            return Err(LedgerError::StakeTooSmall {
                amount,
                minimum: MIN_STAKE,
            });
        }
        if role == Role::Pool {
            return Err(LedgerError::InvalidStakeRole(role));
        }

        let mut record = self.record_or_default(owner);
        record.stake_amount = add(record.stake_amount, amount)?;
        record.stake_locked_until = add(now, STAKE_LOCK_PERIOD)?;
        record.slash_count = 0;
        record.stake_role = Some(role);

        let receipt = StakeRecord {
            owner: owner.clone(),
            amount,
            role,
            locked_until: record.stake_locked_until,
            slash_count: 0,
        };

        info!(
            %owner,
            ?role,
            amount,
            total_stake = record.stake_amount,
            locked_until = record.stake_locked_until,
            "Stake deposited"
        );
        self.store(owner, record);

        Ok(receipt)
    }

    /// Release the owner's whole current stake once the lock has expired
    pub fn withdraw_stake(&mut self, stake: &StakeRecord, now: u64) -> Result<u64> {
        let mut record = self.record_or_default(&stake.owner);

        // A later deposit extends the lock beyond the receipt's.
        let locked_until = record.stake_locked_until.max(stake.locked_until);
        if now < locked_until {
            return Err(LedgerError::StakeStillLocked { now, locked_until });
        }

        let payout = record.stake_amount;
        if payout == 0 && !self.participants.contains_key(&stake.owner) {
            return Ok(0);
        }

        record.stake_amount = 0;
        record.slash_count = 0;

        info!(owner = %stake.owner, payout, "Stake withdrawn");
        self.store(&stake.owner, record);

        Ok(payout)
    }

    pub fn stake_of(&self, owner: &ParticipantId) -> u64 {
        self.participants
            .get(owner)
            .map(|r| r.stake_amount)
            .unwrap_or(0)
    }
}
