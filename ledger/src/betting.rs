//! Betting engine
//!
//! Sizes bets from inference confidence, caps aggregate exposure at a
//! fraction of pool liquidity and settles outcomes back into the pool.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::{MAX_BET_MULTIPLIER, MAX_POOL_EXPOSURE_PERCENT, MIN_BET, MIN_CONFIDENCE, SCALE};
use crate::error::{ArithmeticError, LedgerError, Result};
use crate::fixed::{add, mul_div, percent_of, sub};
use crate::pool::LiquidityPool;
use crate::types::{BetId, BetPosition, BetSettlement, BetStats, Category, Signal};

/// Bet bookkeeping. Exposure is the sum of all open position amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettingEngine {
    stats: BetStats,
    next_bet_id: u64,
    positions: BTreeMap<BetId, BetPosition>,
}

impl BettingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// `floor(total_liquidity * 10%)`
    pub fn max_exposure(&self, pool: &LiquidityPool) -> Result<u64> {
        Ok(percent_of(pool.total_liquidity(), MAX_POOL_EXPOSURE_PERCENT)?)
    }

    /// Room left under the cap, zero once the cap is reached
    pub fn available_exposure(&self, pool: &LiquidityPool) -> Result<u64> {
        Ok(self
            .max_exposure(pool)?
            .saturating_sub(self.stats.current_exposure))
    }

    pub fn current_exposure(&self) -> u64 {
        self.stats.current_exposure
    }

    /// Open a bet sized by `signal.confidence` against the remaining room
    pub fn place_bet(
        &mut self,
        pool: &mut LiquidityPool,
        signal: Signal,
        target_category: Category,
        target_value: u64,
        threshold: u64,
        now: u64,
    ) -> Result<BetPosition> {
        if pool.total_liquidity() == 0 {
            return Err(LedgerError::NoLiquidity);
        }

        let max_exposure = self.max_exposure(pool)?;
        let exposure = self.stats.current_exposure;
        if exposure >= max_exposure {
            return Err(LedgerError::ExposureCapReached {
                exposure,
                cap: max_exposure,
            });
        }

        if signal.confidence < MIN_CONFIDENCE {
            return Err(LedgerError::LowConfidence {
                confidence: signal.confidence,
                minimum: MIN_CONFIDENCE,
            });
        }

        let available = max_exposure - exposure;
        if available < 2 * MIN_BET {
            return Err(LedgerError::InsufficientRoom {
                available,
                required: 2 * MIN_BET,
            });
        }

        let amount = size_bet(available, signal.confidence)?;
        if amount < MIN_BET {
            return Err(LedgerError::BetTooSmall {
                amount,
                minimum: MIN_BET,
            });
        }
        if amount > available {
            return Err(LedgerError::invariant(format!(
                "bet {} exceeds available exposure {}",
                amount, available
            )));
        }

        let bet_id = BetId(self.next_bet_id + 1);
        let mut stats = self.stats.clone();
        stats.total_placed = add(stats.total_placed, 1)?;
        stats.active_bets = add(stats.active_bets, 1)?;
        stats.current_exposure = add(stats.current_exposure, amount)?;

        pool.record_bet(amount)?;

        let position = BetPosition {
            id: bet_id,
            signal,
            amount,
            target_category,
            target_value,
            threshold,
            placed_at: now,
            settled: false,
        };

        self.stats = stats;
        self.next_bet_id = bet_id.0;
        self.positions.insert(bet_id, position.clone());

        debug!(
            %bet_id,
            amount,
            confidence = signal.confidence,
            exposure = self.stats.current_exposure,
            cap = max_exposure,
            "Bet placed"
        );

        Ok(position)
    }

    /// Resolve an open bet: a win credits the pool, a loss debits it
    pub fn settle_bet(
        &mut self,
        pool: &mut LiquidityPool,
        bet_id: BetId,
        actual_value: u64,
    ) -> Result<BetSettlement> {
        let position = self.open_position(bet_id)?;
        let amount = position.amount;
        let is_win = actual_value >= position.target_value;

        let mut stats = self.release(amount)?;
        if is_win {
            stats.win_count = add(stats.win_count, 1)?;
            stats.total_profit = add(stats.total_profit, amount)?;
            pool.record_profit(amount)?;
        } else {
            stats.loss_count = add(stats.loss_count, 1)?;
            stats.total_loss = add(stats.total_loss, amount)?;
            pool.record_loss(amount)?;
        }

        self.stats = stats;
        self.mark_settled(bet_id);

        info!(%bet_id, amount, is_win, actual_value, "Bet settled");

        Ok(BetSettlement {
            bet_id,
            amount,
            is_win,
        })
    }

    /// Release an open bet without touching the pool; returns the refund
    pub fn cancel_bet(&mut self, bet_id: BetId) -> Result<u64> {
        let amount = self.open_position(bet_id)?.amount;
        self.stats = self.release(amount)?;
        self.mark_settled(bet_id);

        info!(%bet_id, amount, "Bet cancelled");
        Ok(amount)
    }

    pub fn get_stats(&self) -> BetStats {
        self.stats.clone()
    }

    /// `wins * SCALE / (wins + losses)`, zero before any settlement
    pub fn win_rate(&self) -> u64 {
        let total = self.stats.win_count + self.stats.loss_count;
        if total == 0 {
            return 0;
        }
        mul_div(self.stats.win_count, SCALE, total).unwrap_or(0)
    }

    pub fn position(&self, bet_id: BetId) -> Option<&BetPosition> {
        self.positions.get(&bet_id)
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &BetPosition> {
        self.positions.values().filter(|p| !p.settled)
    }

    fn open_position(&self, bet_id: BetId) -> Result<&BetPosition> {
        let position = self
            .positions
            .get(&bet_id)
            .ok_or(LedgerError::UnknownBet(bet_id))?;
        if position.settled {
            return Err(LedgerError::AlreadySettled(bet_id));
        }
        Ok(position)
    }

    /// Counters after taking `amount` out of the open book
    fn release(&self, amount: u64) -> Result<BetStats> {
        let mut stats = self.stats.clone();
        stats.current_exposure = sub(stats.current_exposure, amount)?;
        stats.active_bets = sub(stats.active_bets, 1)?;
        stats.total_settled = add(stats.total_settled, 1)?;
        Ok(stats)
    }

    fn mark_settled(&mut self, bet_id: BetId) {
        if let Some(position) = self.positions.get_mut(&bet_id) {
            position.settled = true;
        }
    }
}

/// `min(available * confidence / SCALE, available * MAX_BET_MULTIPLIER)`
///
/// The multiplier cap cannot bind while confidence stays within `[0, SCALE]`.
pub fn size_bet(available: u64, confidence: u64) -> Result<u64> {
    let sized = mul_div(available, confidence, SCALE)?;
    let capped = available
        .checked_mul(MAX_BET_MULTIPLIER)
        .ok_or(ArithmeticError::Overflow)?;
    Ok(sized.min(capped))
}
