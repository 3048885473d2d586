//! Profit distribution, reputation and staking
//!
//! Splits settled profit 40/40/20 between data provider, model creator and
//! pool, paying reputation bonuses out of the pool leg. Tracks per-participant
//! reputation, activity and staked collateral.

pub mod reputation;
pub mod staking;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{DATA_PROVIDER_SHARE, MODEL_CREATOR_SHARE, SCALE};
use crate::error::{LedgerError, Result};
use crate::fixed::{add, mul_div};
use crate::types::{
    Distribution, DistributionStats, ParticipantId, ParticipantInfo, ParticipantRecord,
    PredictionId, ProfitShare, Role,
};

/// Stake removed from each contributor by one failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub data_provider_slashed: u64,
    pub model_creator_slashed: u64,
}

/// Participant registry plus distribution aggregates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitDistributor {
    participants: BTreeMap<ParticipantId, ParticipantRecord>,
    history: BTreeMap<PredictionId, u64>,
    stats: DistributionStats,
}

impl ProfitDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `amount` and reward both contributors
    pub fn distribute_profit(
        &mut self,
        amount: u64,
        data_provider: &ParticipantId,
        model_creator: &ParticipantId,
        prediction_id: PredictionId,
    ) -> Result<Distribution> {
        let data_reputation = self.reputation_of(data_provider);
        let model_reputation = self.reputation_of(model_creator);

        let base_data = mul_div(amount, DATA_PROVIDER_SHARE, SCALE)?;
        let base_model = mul_div(amount, MODEL_CREATOR_SHARE, SCALE)?;
        // The pool leg takes the truncation remainder so the legs sum to `amount`.
        let base_pool = amount - base_data - base_model;

        let data_bonus = reputation::bonus(base_data, data_reputation)?;
        let model_bonus = reputation::bonus(base_model, model_reputation)?;

        let pool_share = base_pool
            .checked_sub(data_bonus + model_bonus)
            .ok_or_else(|| {
                LedgerError::invariant(format!(
                    "bonuses {} + {} exceed pool leg {}",
                    data_bonus, model_bonus, base_pool
                ))
            })?;

        let distribution = Distribution {
            data_share: ProfitShare {
                owner: data_provider.clone(),
                amount: base_data + data_bonus,
                role: Role::DataProvider,
                prediction_id,
                reputation_bonus: data_bonus,
            },
            model_share: ProfitShare {
                owner: model_creator.clone(),
                amount: base_model + model_bonus,
                role: Role::ModelCreator,
                prediction_id,
                reputation_bonus: model_bonus,
            },
            pool_share,
        };

        let mut touched = BTreeMap::new();
        for participant in [data_provider, model_creator] {
            let record = touched
                .entry(participant.clone())
                .or_insert_with(|| self.record_or_default(participant));
            record.reputation = reputation::after_win(record.reputation);
            record.contributions = add(record.contributions, 1)?;
            record.successes = add(record.successes, 1)?;
        }

        let stats = DistributionStats {
            total_distributions: add(self.stats.total_distributions, 1)?,
            total_profit_distributed: add(self.stats.total_profit_distributed, amount)?,
            total_data_provider_paid: add(
                self.stats.total_data_provider_paid,
                distribution.data_share.amount,
            )?,
            total_model_creator_paid: add(
                self.stats.total_model_creator_paid,
                distribution.model_share.amount,
            )?,
            total_pool_allocated: add(self.stats.total_pool_allocated, pool_share)?,
        };

        self.participants.extend(touched);
        self.history.insert(prediction_id, amount);
        self.stats = stats;

        info!(
            %prediction_id,
            amount,
            data_provider = %data_provider,
            data_share = distribution.data_share.amount,
            model_creator = %model_creator,
            model_share = distribution.model_share.amount,
            pool_share,
            "Profit distributed"
        );

        Ok(distribution)
    }

    /// Dock reputation and slash stake of both contributors after a failed call
    pub fn penalize_failure(
        &mut self,
        data_provider: &ParticipantId,
        model_creator: &ParticipantId,
        loss_amount: u64,
    ) -> Result<Penalty> {
        let mut touched = BTreeMap::new();
        let mut slashed = [0u64; 2];

        for (i, participant) in [data_provider, model_creator].into_iter().enumerate() {
            let record = touched
                .entry(participant.clone())
                .or_insert_with(|| self.record_or_default(participant));
            record.reputation = reputation::after_loss(record.reputation);
            record.contributions = add(record.contributions, 1)?;

            if record.stake_amount > 0 {
                let (remaining, slash_count, penalty) =
                    reputation::slash(record.stake_amount, record.slash_count)?;
                record.stake_amount = remaining;
                record.slash_count = slash_count;
                slashed[i] = penalty;

                warn!(
                    %participant,
                    penalty,
                    remaining,
                    slash_count,
                    "Stake slashed"
                );
            }
        }

        self.participants.extend(touched);

        let penalty = Penalty {
            data_provider_slashed: slashed[0],
            model_creator_slashed: slashed[1],
        };
        info!(
            data_provider = %data_provider,
            model_creator = %model_creator,
            loss_amount,
            ?penalty,
            "Failure penalized"
        );

        Ok(penalty)
    }

    /// Lazily defaulted view; does not create a record
    pub fn get_participant_info(&self, participant: &ParticipantId) -> ParticipantInfo {
        self.record_or_default(participant).info(participant)
    }

    pub fn success_rate(&self, participant: &ParticipantId) -> u64 {
        self.participants
            .get(participant)
            .map(ParticipantRecord::success_rate)
            .unwrap_or(0)
    }

    pub fn reputation_of(&self, participant: &ParticipantId) -> u64 {
        self.participants
            .get(participant)
            .map(|r| r.reputation)
            .unwrap_or_else(|| ParticipantRecord::new().reputation)
    }

    pub fn get_distribution_stats(&self) -> DistributionStats {
        self.stats.clone()
    }

    /// Profit distributed for `prediction_id`, if any
    pub fn distribution_history(&self, prediction_id: PredictionId) -> Option<u64> {
        self.history.get(&prediction_id).copied()
    }

    pub fn participants(&self) -> impl Iterator<Item = (&ParticipantId, &ParticipantRecord)> {
        self.participants.iter()
    }

    fn record_or_default(&self, participant: &ParticipantId) -> ParticipantRecord {
        match self.participants.get(participant) {
            Some(record) => record.clone(),
            None => {
                debug!(%participant, "Initializing participant record");
                ParticipantRecord::new()
            }
        }
    }

    /// Commit a single updated record
    fn store(&mut self, participant: &ParticipantId, record: ParticipantRecord) {
        self.participants.insert(participant.clone(), record);
    }
}
