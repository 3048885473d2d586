//! Single-writer ledger service
//!
//! One tokio task owns a [`Ledger`] and applies queued transitions in
//! arrival order. Handles send boxed closures over a bounded `mpsc` channel
//! and receive the result over a `oneshot`. After every successful write the
//! task republishes a snapshot, before replying, so readers never queue
//! behind writers and never miss a write they awaited.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::distribution::Penalty;
use crate::error::{LedgerError, Result};
use crate::inference::Prediction;
use crate::ledger::{Ledger, LedgerSnapshot, SettlementOutcome};
use crate::types::{
    BetId, BetPosition, BetSettlement, BetStats, Category, DepositReceipt, Distribution,
    FeedPayload, MarketId, Model, ParticipantId, ParticipantInfo, ParticipantRecord, PoolStats,
    PredictionId, Role, ShareId, Signal, StakeRecord,
};

/// Transition run on the writer task; returns whether the ledger changed
///
/// A job publishes the new snapshot itself before replying, so a caller
/// always reads its own write.
type Job = Box<dyn FnOnce(&mut Ledger, &RwLock<LedgerSnapshot>) -> bool + Send>;

enum Command {
    Run(Job),
    Shutdown,
}

/// Writer task state
pub struct LedgerService {
    market: MarketId,
    ledger: Ledger,
    receiver: mpsc::Receiver<Command>,
    snapshot: Arc<RwLock<LedgerSnapshot>>,
}

impl LedgerService {
    /// Spawn the writer task for `ledger` and return a handle to it
    ///
    /// The join handle yields the final ledger once the service shuts down.
    pub fn spawn(
        market: MarketId,
        ledger: Ledger,
        channel_capacity: usize,
    ) -> (LedgerHandle, JoinHandle<Ledger>) {
        let (sender, receiver) = mpsc::channel(channel_capacity.max(1));
        let snapshot = Arc::new(RwLock::new(ledger.snapshot()));

        let service = Self {
            market,
            ledger,
            receiver,
            snapshot: Arc::clone(&snapshot),
        };
        let task = tokio::spawn(service.run());

        let handle = LedgerHandle {
            market,
            sender,
            snapshot,
        };
        (handle, task)
    }

    async fn run(mut self) -> Ledger {
        info!(market = %self.market, "Ledger service started");

        let mut applied: u64 = 0;
        while let Some(command) = self.receiver.recv().await {
            match command {
                Command::Run(job) => {
                    if job(&mut self.ledger, &*self.snapshot) {
                        applied += 1;
                    }
                }
                Command::Shutdown => break,
            }
        }

        info!(market = %self.market, applied, "Ledger service stopped");
        self.ledger
    }
}

/// Cloneable client of one ledger service
#[derive(Clone)]
pub struct LedgerHandle {
    market: MarketId,
    sender: mpsc::Sender<Command>,
    snapshot: Arc<RwLock<LedgerSnapshot>>,
}

impl LedgerHandle {
    pub fn market(&self) -> MarketId {
        self.market
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queue `op` on the writer and wait for its result
    async fn call<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Ledger) -> Result<T> + Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        let market = self.market;

        let job: Job = Box::new(move |ledger, snapshot| {
            let result = f(ledger);
            let changed = result.is_ok();
            if changed {
                *snapshot.write() = ledger.snapshot();
            }
            if let Err(e) = &result {
                debug!(%market, op, error = %e, category = e.category(), "Transition rejected");
                if e.is_fatal() {
                    warn!(%market, op, error = %e, "Accounting defect surfaced");
                }
            }
            // The caller may have stopped waiting; the transition stands either way.
            let _ = reply.send(result);
            changed
        });

        self.sender
            .send(Command::Run(job))
            .await
            .map_err(|_| LedgerError::service_unavailable(format!("market {} is closed", market)))?;

        response.await.map_err(|_| {
            LedgerError::service_unavailable(format!("market {} dropped {}", market, op))
        })?
    }

    /// Ask the writer to stop after the commands already queued
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(Command::Shutdown)
            .await
            .map_err(|_| LedgerError::service_unavailable(format!("market {} is closed", self.market)))
    }

    // Reads, served from the last published snapshot

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.snapshot.read().clone()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.snapshot.read().pool.clone()
    }

    pub fn bet_stats(&self) -> BetStats {
        self.snapshot.read().bets.clone()
    }

    pub fn participant_info(&self, participant: &ParticipantId) -> ParticipantInfo {
        self.snapshot
            .read()
            .participant(participant)
            .cloned()
            .unwrap_or_else(|| ParticipantRecord::new().info(participant))
    }

    pub fn success_rate(&self, participant: &ParticipantId) -> u64 {
        let info = self.participant_info(participant);
        ParticipantRecord {
            contributions: info.contributions,
            successes: info.successes,
            ..ParticipantRecord::new()
        }
        .success_rate()
    }

    // Writes

    pub async fn deposit(&self, owner: ParticipantId, amount: u64) -> Result<DepositReceipt> {
        self.call("deposit", move |ledger| ledger.deposit(owner, amount))
            .await
    }

    pub async fn withdraw(&self, share_id: ShareId) -> Result<u64> {
        self.call("withdraw", move |ledger| ledger.withdraw(share_id))
            .await
    }

    pub async fn place_bet(
        &self,
        signal: Signal,
        target_category: Category,
        target_value: u64,
        threshold: u64,
        now: u64,
    ) -> Result<BetPosition> {
        self.call("place_bet", move |ledger| {
            ledger.place_bet(signal, target_category, target_value, threshold, now)
        })
        .await
    }

    pub async fn predict_and_bet(
        &self,
        feed: FeedPayload,
        model: Model,
        target_category: Category,
        target_value: u64,
        threshold: u64,
        now: u64,
    ) -> Result<(Prediction, BetPosition)> {
        self.call("predict_and_bet", move |ledger| {
            ledger.predict_and_bet(&feed, &model, target_category, target_value, threshold, now)
        })
        .await
    }

    pub async fn settle_bet(&self, bet_id: BetId, actual_value: u64) -> Result<BetSettlement> {
        self.call("settle_bet", move |ledger| ledger.settle_bet(bet_id, actual_value))
            .await
    }

    pub async fn cancel_bet(&self, bet_id: BetId) -> Result<u64> {
        self.call("cancel_bet", move |ledger| ledger.cancel_bet(bet_id))
            .await
    }

    pub async fn distribute_profit(
        &self,
        amount: u64,
        data_provider: ParticipantId,
        model_creator: ParticipantId,
        prediction_id: PredictionId,
    ) -> Result<Distribution> {
        self.call("distribute_profit", move |ledger| {
            ledger.distribute_profit(amount, &data_provider, &model_creator, prediction_id)
        })
        .await
    }

    pub async fn penalize_failure(
        &self,
        data_provider: ParticipantId,
        model_creator: ParticipantId,
        loss_amount: u64,
    ) -> Result<Penalty> {
        self.call("penalize_failure", move |ledger| {
            ledger.penalize_failure(&data_provider, &model_creator, loss_amount)
        })
        .await
    }

    pub async fn deposit_stake(
        &self,
        amount: u64,
        role: Role,
        owner: ParticipantId,
        now: u64,
    ) -> Result<StakeRecord> {
        self.call("deposit_stake", move |ledger| {
            ledger.deposit_stake(amount, role, &owner, now)
        })
        .await
    }

    pub async fn withdraw_stake(&self, stake: StakeRecord, now: u64) -> Result<u64> {
        self.call("withdraw_stake", move |ledger| ledger.withdraw_stake(&stake, now))
            .await
    }

    pub async fn settle_prediction(
        &self,
        bet_id: BetId,
        actual_value: u64,
        data_provider: ParticipantId,
        model_creator: ParticipantId,
        prediction_id: PredictionId,
    ) -> Result<SettlementOutcome> {
        self.call("settle_prediction", move |ledger| {
            ledger.settle_prediction(
                bet_id,
                actual_value,
                &data_provider,
                &model_creator,
                prediction_id,
            )
        })
        .await
    }
}
