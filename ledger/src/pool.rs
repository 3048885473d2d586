//! Liquidity-pool ledger
//!
//! Share-based accounting: a share is always worth
//! `total_liquidity / total_shares`, so profit and loss move every
//! outstanding share at once without per-record bookkeeping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::constants::{MIN_DEPOSIT, SCALE};
use crate::error::{LedgerError, Result};
use crate::fixed::{add, div, mul_div, sub};
use crate::types::{DepositReceipt, ParticipantId, PoolStats, ShareId, ShareRecord};

/// Singleton pool ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPool {
    total_liquidity: u64,
    total_shares: u64,
    total_bets: u64,
    total_profit: u64,
    total_loss: u64,
    next_share_id: u64,
    shares: BTreeMap<ShareId, ShareRecord>,
}

impl LiquidityPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_liquidity(&self) -> u64 {
        self.total_liquidity
    }

    pub fn total_shares(&self) -> u64 {
        self.total_shares
    }

    /// Deposit `amount` and mint a fresh share record for `owner`
    pub fn deposit(&mut self, owner: ParticipantId, amount: u64) -> Result<DepositReceipt> {
        if amount < MIN_DEPOSIT {
            return Err(LedgerError::DepositTooSmall {
                amount,
                minimum: MIN_DEPOSIT,
            });
        }

        let shares = if self.total_shares == 0 {
            amount
        } else if self.total_liquidity == 0 {
            // Outstanding shares back nothing; a proportional mint is undefined.
            return Err(LedgerError::PoolEmpty);
        } else {
            mul_div(amount, self.total_shares, self.total_liquidity)?
        };
        if shares == 0 {
            // The deposit would be absorbed by existing holders.
            return Err(LedgerError::NoSharesMinted {
                amount,
                share_value: self.share_value(),
            });
        }

        let total_liquidity = add(self.total_liquidity, amount)?;
        let total_shares = add(self.total_shares, shares)?;
        let share_value = div(total_liquidity, total_shares)?;
        let share_id = ShareId(self.next_share_id + 1);

        self.total_liquidity = total_liquidity;
        self.total_shares = total_shares;
        self.next_share_id = share_id.0;
        self.shares.insert(
            share_id,
            ShareRecord {
                id: share_id,
                owner: owner.clone(),
                shares,
            },
        );

        debug!(%owner, %share_id, amount, shares, share_value, "Liquidity deposited");

        Ok(DepositReceipt {
            share_id,
            shares,
            share_value,
        })
    }

    /// Burn a share record and pay out its proportional liquidity
    pub fn withdraw(&mut self, share_id: ShareId) -> Result<u64> {
        let record = self
            .shares
            .get(&share_id)
            .ok_or(LedgerError::UnknownShare(share_id))?;

        if self.total_liquidity == 0 || self.total_shares == 0 {
            return Err(LedgerError::PoolEmpty);
        }

        let withdrawal = mul_div(record.shares, self.total_liquidity, self.total_shares)?;
        let total_liquidity = sub(self.total_liquidity, withdrawal)?;
        let total_shares = sub(self.total_shares, record.shares)?;

        debug!(owner = %record.owner, %share_id, shares = record.shares, withdrawal, "Liquidity withdrawn");

        self.total_liquidity = total_liquidity;
        self.total_shares = total_shares;
        self.shares.remove(&share_id);

        Ok(withdrawal)
    }

    /// Count a placed bet; liquidity is untouched until settlement
    pub fn record_bet(&mut self, _amount: u64) -> Result<()> {
        self.total_bets = add(self.total_bets, 1)?;
        Ok(())
    }

    /// Raise every share's value by crediting `amount`
    pub fn record_profit(&mut self, amount: u64) -> Result<()> {
        let total_liquidity = add(self.total_liquidity, amount)?;
        let total_profit = add(self.total_profit, amount)?;

        self.total_liquidity = total_liquidity;
        self.total_profit = total_profit;

        info!(amount, total_liquidity, "Pool profit recorded");
        Ok(())
    }

    /// Lower every share's value by debiting `amount`
    pub fn record_loss(&mut self, amount: u64) -> Result<()> {
        if amount > self.total_liquidity {
            error!(
                amount,
                total_liquidity = self.total_liquidity,
                "Loss exceeds pool liquidity - exposure accounting is broken"
            );
            return Err(LedgerError::InsufficientLiquidity {
                required: amount,
                available: self.total_liquidity,
            });
        }

        let total_loss = add(self.total_loss, amount)?;
        self.total_liquidity -= amount;
        self.total_loss = total_loss;

        info!(amount, total_liquidity = self.total_liquidity, "Pool loss recorded");
        Ok(())
    }

    /// Current value of `shares` in liquidity units
    pub fn share_value_of(&self, shares: u64) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(0);
        }
        Ok(mul_div(shares, self.total_liquidity, self.total_shares)?)
    }

    pub fn share(&self, share_id: ShareId) -> Option<&ShareRecord> {
        self.shares.get(&share_id)
    }

    pub fn share_records(&self) -> impl Iterator<Item = &ShareRecord> {
        self.shares.values()
    }

    /// Σ outstanding record shares; always equals `total_shares`
    pub fn outstanding_shares(&self) -> u128 {
        self.shares.values().map(|r| r.shares as u128).sum()
    }

    /// Per-share value (fixed-point); saturates at `u64::MAX` once a single
    /// share is worth more than the fixed-point range can express
    pub fn share_value(&self) -> u64 {
        if self.total_shares == 0 {
            return SCALE;
        }
        div(self.total_liquidity, self.total_shares).unwrap_or(u64::MAX)
    }

    pub fn get_pool_stats(&self) -> PoolStats {
        let share_value = self.share_value();

        PoolStats {
            total_liquidity: self.total_liquidity,
            total_shares: self.total_shares,
            total_bets: self.total_bets,
            total_profit: self.total_profit,
            total_loss: self.total_loss,
            share_value,
            net_profit: self.total_profit as i128 - self.total_loss as i128,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> ParticipantId {
        ParticipantId::new("alice")
    }

    fn bob() -> ParticipantId {
        ParticipantId::new("bob")
    }

    #[test]
    fn test_first_and_subsequent_deposit() {
        let mut pool = LiquidityPool::new();

        let first = pool.deposit(alice(), 100_000_000).unwrap();
        assert_eq!(first.shares, 100_000_000);
        assert_eq!(first.share_value, SCALE);

        let second = pool.deposit(bob(), 50_000_000).unwrap();
        assert_eq!(second.shares, 50_000_000);
        assert_ne!(first.share_id, second.share_id);

        assert_eq!(pool.total_liquidity(), 150_000_000);
        assert_eq!(pool.total_shares(), 150_000_000);
    }

    #[test]
    fn test_profit_raises_withdrawal() {
        let mut pool = LiquidityPool::new();
        let first = pool.deposit(alice(), 100_000_000).unwrap();
        pool.deposit(bob(), 50_000_000).unwrap();

        pool.record_profit(20_000_000).unwrap();

        // 100/150 of 170 tokens
        let withdrawal = pool.withdraw(first.share_id).unwrap();
        assert_eq!(withdrawal, 113_333_333);
    }

    #[test]
    fn test_profit_on_single_depositor() {
        let mut pool = LiquidityPool::new();
        let receipt = pool.deposit(alice(), 100_000_000).unwrap();
        pool.record_profit(20_000_000).unwrap();

        assert_eq!(pool.withdraw(receipt.share_id).unwrap(), 120_000_000);
        assert_eq!(pool.total_liquidity(), 0);
        assert_eq!(pool.total_shares(), 0);
    }

    #[test]
    fn test_deposit_after_profit_mints_fewer_shares() {
        let mut pool = LiquidityPool::new();
        pool.deposit(alice(), 100_000_000).unwrap();
        pool.record_profit(20_000_000).unwrap();

        let receipt = pool.deposit(bob(), 60_000_000).unwrap();
        assert_eq!(receipt.shares, 50_000_000);
        assert_eq!(pool.outstanding_shares(), pool.total_shares() as u128);
    }

    #[test]
    fn test_minimum_deposit() {
        let mut pool = LiquidityPool::new();
        let err = pool.deposit(alice(), 999_999).unwrap_err();
        assert!(matches!(err, LedgerError::DepositTooSmall { amount: 999_999, .. }));
        assert_eq!(pool, LiquidityPool::new());

        assert!(pool.deposit(alice(), MIN_DEPOSIT).is_ok());
    }

    #[test]
    fn test_withdraw_unknown_share() {
        let mut pool = LiquidityPool::new();
        pool.deposit(alice(), 10_000_000).unwrap();

        let err = pool.withdraw(ShareId(99)).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownShare(ShareId(99))));
    }

    #[test]
    fn test_withdraw_twice_fails() {
        let mut pool = LiquidityPool::new();
        let receipt = pool.deposit(alice(), 10_000_000).unwrap();
        pool.withdraw(receipt.share_id).unwrap();

        assert!(matches!(
            pool.withdraw(receipt.share_id),
            Err(LedgerError::UnknownShare(_))
        ));
    }

    #[test]
    fn test_loss_lowers_share_value() {
        let mut pool = LiquidityPool::new();
        let receipt = pool.deposit(alice(), 100_000_000).unwrap();
        pool.record_loss(10_000_000).unwrap();

        let stats = pool.get_pool_stats();
        assert_eq!(stats.share_value, 900_000);
        assert_eq!(stats.net_profit, -10_000_000);
        assert_eq!(pool.withdraw(receipt.share_id).unwrap(), 90_000_000);
    }

    #[test]
    fn test_loss_beyond_liquidity_is_rejected() {
        let mut pool = LiquidityPool::new();
        pool.deposit(alice(), 10_000_000).unwrap();
        let before = pool.clone();

        let err = pool.record_loss(10_000_001).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(pool, before);
    }

    #[test]
    fn test_total_wipeout_blocks_deposit_and_withdraw() {
        let mut pool = LiquidityPool::new();
        let receipt = pool.deposit(alice(), 10_000_000).unwrap();
        pool.record_loss(10_000_000).unwrap();

        assert!(matches!(pool.withdraw(receipt.share_id), Err(LedgerError::PoolEmpty)));
        assert!(matches!(pool.deposit(bob(), 10_000_000), Err(LedgerError::PoolEmpty)));
    }

    #[test]
    fn test_record_bet_only_counts() {
        let mut pool = LiquidityPool::new();
        pool.deposit(alice(), 10_000_000).unwrap();
        pool.record_bet(5_000_000).unwrap();

        let stats = pool.get_pool_stats();
        assert_eq!(stats.total_bets, 1);
        assert_eq!(stats.total_liquidity, 10_000_000);
    }

    #[test]
    fn test_share_value_of() {
        let mut pool = LiquidityPool::new();
        assert_eq!(pool.share_value_of(1_000).unwrap(), 0);

        pool.deposit(alice(), 100_000_000).unwrap();
        pool.record_profit(50_000_000).unwrap();
        assert_eq!(pool.share_value_of(10_000_000).unwrap(), 15_000_000);
    }

    #[test]
    fn test_deposit_minting_no_shares_is_rejected() {
        let mut pool = LiquidityPool::new();
        pool.deposit(alice(), MIN_DEPOSIT).unwrap();
        // One share is now worth two million tokens
        pool.record_profit(1_999_999_999_999_000_000).unwrap();
        let before = pool.clone();

        let err = pool.deposit(bob(), 1_000_000).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NoSharesMinted { amount: 1_000_000, share_value } if share_value == 2_000_000_000_000 * SCALE
        ));
        assert_eq!(err.category(), "pool");
        assert_eq!(pool, before);

        // Large enough to buy a whole share
        let receipt = pool.deposit(bob(), 2_000_000_000_000).unwrap();
        assert_eq!(receipt.shares, 1);
        assert_eq!(pool.outstanding_shares(), pool.total_shares() as u128);
    }

    #[test]
    fn test_share_value_saturates() {
        let mut pool = LiquidityPool::new();
        let first = pool.deposit(alice(), MIN_DEPOSIT).unwrap();
        pool.record_profit(999_999_999_999_000_000).unwrap();
        let second = pool.deposit(bob(), 1_000_000_000_000).unwrap();
        assert_eq!(second.shares, 1);

        // Leave a single share outstanding
        pool.withdraw(first.share_id).unwrap();
        assert_eq!(pool.total_shares(), 1);
        pool.record_profit(1_000_000_000_000_000_000).unwrap();

        assert_eq!(pool.share_value(), u64::MAX);
        assert_eq!(pool.get_pool_stats().share_value, u64::MAX);
        assert_eq!(pool.total_liquidity(), 1_000_001_000_000_000_000);
        assert_eq!(pool.share_value_of(1).unwrap(), pool.total_liquidity());
        assert_eq!(pool.withdraw(second.share_id).unwrap(), 1_000_001_000_000_000_000);
        assert_eq!(pool.get_pool_stats().share_value, SCALE);
    }
}
