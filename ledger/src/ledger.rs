//! Ledger aggregate
//!
//! Owns the pool, the betting engine and the distributor for one market and
//! exposes every transition on a single value. Composite transitions run on
//! a scratch copy that replaces `self` only when every step succeeded.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::betting::BettingEngine;
use crate::constants::{MAX_REPUTATION, MIN_REPUTATION};
use crate::distribution::{Penalty, ProfitDistributor};
use crate::error::{LedgerError, Result};
use crate::inference::{InferenceEngine, Prediction};
use crate::pool::LiquidityPool;
use crate::types::{
    BetId, BetPosition, BetSettlement, BetStats, Category, DepositReceipt, Distribution,
    DistributionStats, FeedPayload, Model, ParticipantId, ParticipantInfo, PoolStats,
    PredictionId, Role, ShareId, Signal, StakeRecord,
};

/// Result of resolving a prediction end to end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    Won {
        settlement: BetSettlement,
        distribution: Distribution,
    },
    Lost {
        settlement: BetSettlement,
        penalty: Penalty,
    },
}

impl SettlementOutcome {
    pub fn settlement(&self) -> &BetSettlement {
        match self {
            SettlementOutcome::Won { settlement, .. } | SettlementOutcome::Lost { settlement, .. } => {
                settlement
            }
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, SettlementOutcome::Won { .. })
    }

    pub fn distribution(&self) -> Option<&Distribution> {
        match self {
            SettlementOutcome::Won { distribution, .. } => Some(distribution),
            SettlementOutcome::Lost { .. } => None,
        }
    }
}

/// Owned point-in-time view of a ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub pool: PoolStats,
    pub bets: BetStats,
    pub win_rate: u64,
    pub distribution: DistributionStats,
    pub participants: Vec<ParticipantInfo>,
    pub open_positions: Vec<BetPosition>,
}

impl LedgerSnapshot {
    pub fn participant(&self, id: &ParticipantId) -> Option<&ParticipantInfo> {
        self.participants.iter().find(|p| &p.participant == id)
    }
}

/// Economic state of one prediction market
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(skip)]
    inference: InferenceEngine,
    pool: LiquidityPool,
    betting: BettingEngine,
    distributor: ProfitDistributor,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &LiquidityPool {
        &self.pool
    }

    pub fn betting(&self) -> &BettingEngine {
        &self.betting
    }

    pub fn distributor(&self) -> &ProfitDistributor {
        &self.distributor
    }

    // Pool

    pub fn deposit(&mut self, owner: ParticipantId, amount: u64) -> Result<DepositReceipt> {
        self.pool.deposit(owner, amount)
    }

    /// Withdrawals are held back while they would push open exposure over the cap.
    pub fn withdraw(&mut self, share_id: ShareId) -> Result<u64> {
        let mut next = self.pool.clone();
        let payout = next.withdraw(share_id)?;

        let exposure = self.betting.current_exposure();
        let cap = self.betting.max_exposure(&next)?;
        if exposure > cap {
            return Err(LedgerError::ExposureCapReached { exposure, cap });
        }

        self.pool = next;
        Ok(payout)
    }

    pub fn share_value_of(&self, shares: u64) -> Result<u64> {
        self.pool.share_value_of(shares)
    }

    pub fn get_pool_stats(&self) -> PoolStats {
        self.pool.get_pool_stats()
    }

    // Inference and betting

    pub fn infer(&self, feed: &FeedPayload, model: &Model) -> Result<Prediction> {
        self.inference.infer(feed, model)
    }

    pub fn place_bet(
        &mut self,
        signal: Signal,
        target_category: Category,
        target_value: u64,
        threshold: u64,
        now: u64,
    ) -> Result<BetPosition> {
        self.betting
            .place_bet(&mut self.pool, signal, target_category, target_value, threshold, now)
    }

    /// Score the feed and back the resulting signal with a bet
    pub fn predict_and_bet(
        &mut self,
        feed: &FeedPayload,
        model: &Model,
        target_category: Category,
        target_value: u64,
        threshold: u64,
        now: u64,
    ) -> Result<(Prediction, BetPosition)> {
        let prediction = self.infer(feed, model)?;
        let position = self.place_bet(
            prediction.signal,
            target_category,
            target_value,
            threshold,
            now,
        )?;
        Ok((prediction, position))
    }

    pub fn settle_bet(&mut self, bet_id: BetId, actual_value: u64) -> Result<BetSettlement> {
        self.betting.settle_bet(&mut self.pool, bet_id, actual_value)
    }

    pub fn cancel_bet(&mut self, bet_id: BetId) -> Result<u64> {
        self.betting.cancel_bet(bet_id)
    }

    pub fn get_bet_stats(&self) -> BetStats {
        self.betting.get_stats()
    }

    pub fn win_rate(&self) -> u64 {
        self.betting.win_rate()
    }

    // Distribution and staking

    pub fn distribute_profit(
        &mut self,
        amount: u64,
        data_provider: &ParticipantId,
        model_creator: &ParticipantId,
        prediction_id: PredictionId,
    ) -> Result<Distribution> {
        self.distributor
            .distribute_profit(amount, data_provider, model_creator, prediction_id)
    }

    pub fn penalize_failure(
        &mut self,
        data_provider: &ParticipantId,
        model_creator: &ParticipantId,
        loss_amount: u64,
    ) -> Result<Penalty> {
        self.distributor
            .penalize_failure(data_provider, model_creator, loss_amount)
    }

    pub fn deposit_stake(
        &mut self,
        amount: u64,
        role: Role,
        owner: &ParticipantId,
        now: u64,
    ) -> Result<StakeRecord> {
        self.distributor.deposit_stake(amount, role, owner, now)
    }

    pub fn withdraw_stake(&mut self, stake: &StakeRecord, now: u64) -> Result<u64> {
        self.distributor.withdraw_stake(stake, now)
    }

    pub fn success_rate(&self, participant: &ParticipantId) -> u64 {
        self.distributor.success_rate(participant)
    }

    pub fn get_participant_info(&self, participant: &ParticipantId) -> ParticipantInfo {
        self.distributor.get_participant_info(participant)
    }

    pub fn get_distribution_stats(&self) -> DistributionStats {
        self.distributor.get_distribution_stats()
    }

    /// Settle a bet and reward or penalise the contributors behind it
    ///
    /// A win distributes the bet amount as profit; a loss penalises both
    /// contributors with the bet amount as the loss.
    pub fn settle_prediction(
        &mut self,
        bet_id: BetId,
        actual_value: u64,
        data_provider: &ParticipantId,
        model_creator: &ParticipantId,
        prediction_id: PredictionId,
    ) -> Result<SettlementOutcome> {
        let mut next = self.clone();

        let settlement = next.settle_bet(bet_id, actual_value)?;
        let outcome = if settlement.is_win {
            let distribution = next.distribute_profit(
                settlement.amount,
                data_provider,
                model_creator,
                prediction_id,
            )?;
            SettlementOutcome::Won {
                settlement,
                distribution,
            }
        } else {
            let penalty = next.penalize_failure(data_provider, model_creator, settlement.amount)?;
            SettlementOutcome::Lost {
                settlement,
                penalty,
            }
        };

        next.check_invariants()?;
        *self = next;

        info!(
            %bet_id,
            %prediction_id,
            is_win = outcome.is_win(),
            amount = outcome.settlement().amount,
            "Prediction settled"
        );

        Ok(outcome)
    }

    /// Verify the cross-component invariants
    pub fn check_invariants(&self) -> Result<()> {
        // A settled loss shrinks exposure by its full amount but the cap by a
        // tenth of it, so open exposure stays under the cap.
        let exposure = self.betting.current_exposure();
        let liquidity = self.pool.total_liquidity();
        let cap = self.betting.max_exposure(&self.pool)?;
        if exposure > cap {
            return self.violation(format!(
                "open exposure {} exceeds cap {} on liquidity {}",
                exposure, cap, liquidity
            ));
        }

        let outstanding = self.pool.outstanding_shares();
        if outstanding != self.pool.total_shares() as u128 {
            return self.violation(format!(
                "share records hold {} but pool reports {}",
                outstanding,
                self.pool.total_shares()
            ));
        }

        if let Some((id, record)) = self
            .distributor
            .participants()
            .find(|(_, r)| !(MIN_REPUTATION..=MAX_REPUTATION).contains(&r.reputation))
        {
            return self.violation(format!("{} has reputation {}", id, record.reputation));
        }

        debug!(exposure, cap, liquidity, %outstanding, "Ledger invariants hold");
        Ok(())
    }

    fn violation(&self, message: String) -> Result<()> {
        error!(%message, "Ledger invariant violated");
        Err(LedgerError::invariant(message))
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            pool: self.pool.get_pool_stats(),
            bets: self.betting.get_stats(),
            win_rate: self.betting.win_rate(),
            distribution: self.distributor.get_distribution_stats(),
            participants: self
                .distributor
                .participants()
                .map(|(id, record)| record.info(id))
                .collect(),
            open_positions: self.betting.open_positions().cloned().collect(),
        }
    }
}
