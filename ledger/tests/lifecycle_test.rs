//! End-to-end ledger lifecycle tests

use oracle_ledger::{
    Algorithm, BetId, Category, FeedPayload, InferenceEngine, Ledger, LedgerError, LiquidityPool,
    Model, ParticipantId, PredictionId, Role, SettlementOutcome,
};

fn lp(name: &str) -> ParticipantId {
    ParticipantId::new(name)
}

fn tree_model(bias: i64) -> Model {
    Model {
        weights: [1_000_000, 500_000, 400_000, 0],
        bias,
        threshold: 0,
        category: Category(7),
        algorithm: Algorithm::Tree,
    }
}

#[test]
fn test_deposit_profit_withdraw() {
    let mut pool = LiquidityPool::new();

    let first = pool.deposit(lp("alice"), 100_000_000).unwrap();
    assert_eq!(first.shares, 100_000_000);
    assert_eq!(first.share_value, 1_000_000);

    let second = pool.deposit(lp("bob"), 50_000_000).unwrap();
    assert_eq!(second.shares, 50_000_000);

    pool.record_profit(20_000_000).unwrap();

    // 100 of 150 shares over 170 tokens of liquidity
    assert_eq!(pool.withdraw(first.share_id).unwrap(), 113_333_333);
    assert_eq!(pool.withdraw(second.share_id).unwrap(), 56_666_667);
    assert_eq!(pool.total_shares(), 0);
    assert_eq!(pool.total_liquidity(), 0);
}

#[test]
fn test_linear_inference_example() {
    let engine = InferenceEngine::new();
    let feed = FeedPayload::new(1_500_000, 900_000, Category(1)).unwrap();
    let model = Model {
        weights: [600_000, 100_000, 200_000, 100_000],
        bias: 100_000,
        threshold: 1_000_000,
        category: Category(1),
        algorithm: Algorithm::Linear,
    };

    let prediction = engine.infer(&feed, &model).unwrap();
    assert_eq!(prediction.signal.score, 1_340_000);
    assert!(prediction.signal.direction);
    assert_eq!(prediction.signal.confidence, 340_000);
}

#[test]
fn test_category_mismatch_is_rejected() {
    let engine = InferenceEngine::new();
    let feed = FeedPayload::new(1_500_000, 900_000, Category(1)).unwrap();

    let err = engine.infer(&feed, &tree_model(0)).unwrap_err();
    assert!(matches!(err, LedgerError::CategoryMismatch { data: 1, model: 7 }));
    assert_eq!(err.category(), "inference");
}

#[test]
fn test_full_market_lifecycle() {
    let mut ledger = Ledger::new();
    let feeder = lp("feeder");
    let modeler = lp("modeler");

    let alice = ledger.deposit(lp("alice"), 600_000_000).unwrap();
    ledger.deposit(lp("bob"), 400_000_000).unwrap();
    let stake = ledger
        .deposit_stake(50_000_000, Role::DataProvider, &feeder, 1_000)
        .unwrap();
    ledger
        .deposit_stake(20_000_000, Role::ModelCreator, &modeler, 1_000)
        .unwrap();

    let feed = FeedPayload::new(1_500_000, 900_000, Category(7)).unwrap();

    // Win: leaf 0.8 + bias 0.05 sizes 85 of the 100 token room
    let (_, first) = ledger
        .predict_and_bet(&feed, &tree_model(50_000), Category(7), 1_500_000, 1_000_000, 1_001)
        .unwrap();
    assert_eq!(first.amount, 85_000_000);

    let won = ledger
        .settle_prediction(first.id, 1_550_000, &feeder, &modeler, PredictionId(1))
        .unwrap();
    let distribution = won.distribution().unwrap().clone();
    assert_eq!(distribution.data_share.amount, 37_400_000);
    assert_eq!(distribution.model_share.amount, 37_400_000);
    assert_eq!(distribution.pool_share, 10_200_000);
    assert_eq!(ledger.get_pool_stats().total_liquidity, 1_085_000_000);

    // Loss: room is now 108.5 tokens
    let (_, second) = ledger
        .predict_and_bet(&feed, &tree_model(50_000), Category(7), 1_600_000, 1_000_000, 1_002)
        .unwrap();
    assert_eq!(second.amount, 92_225_000);

    let lost = ledger
        .settle_prediction(second.id, 1_550_000, &feeder, &modeler, PredictionId(2))
        .unwrap();
    match lost {
        SettlementOutcome::Lost { penalty, .. } => {
            assert_eq!(penalty.data_provider_slashed, 5_000_000);
            assert_eq!(penalty.model_creator_slashed, 2_000_000);
        }
        other => panic!("expected a loss, got {:?}", other),
    }

    let stats = ledger.get_bet_stats();
    assert_eq!((stats.win_count, stats.loss_count), (1, 1));
    assert_eq!(ledger.win_rate(), 500_000);
    assert_eq!(ledger.get_pool_stats().total_liquidity, 992_775_000);

    let info = ledger.get_participant_info(&feeder);
    assert_eq!(info.reputation, 450_000);
    assert_eq!(info.contributions, 2);
    assert_eq!(info.successes, 1);
    assert_eq!(info.stake_amount, 45_000_000);
    assert_eq!(ledger.success_rate(&feeder), 500_000);

    // Stake stays locked until the lock period elapses
    assert!(matches!(
        ledger.withdraw_stake(&stake, 2_000),
        Err(LedgerError::StakeStillLocked { .. })
    ));
    assert_eq!(ledger.withdraw_stake(&stake, stake.locked_until).unwrap(), 45_000_000);

    // 600 of 1000 shares
    assert_eq!(ledger.withdraw(alice.share_id).unwrap(), 595_665_000);
    ledger.check_invariants().unwrap();

    let snapshot = ledger.snapshot();
    assert_eq!(snapshot.distribution.total_distributions, 1);
    assert_eq!(snapshot.bets.total_settled, 2);
    assert!(snapshot.open_positions.is_empty());
}

#[test]
fn test_cancel_then_settle_fails() {
    let mut ledger = Ledger::new();
    ledger.deposit(lp("alice"), 1_000_000_000).unwrap();
    let feed = FeedPayload::new(1_500_000, 900_000, Category(7)).unwrap();
    let (_, position) = ledger
        .predict_and_bet(&feed, &tree_model(0), Category(7), 1_500_000, 1_000_000, 0)
        .unwrap();

    assert_eq!(ledger.cancel_bet(position.id).unwrap(), 80_000_000);
    let before = ledger.clone();

    let err = ledger
        .settle_prediction(position.id, 1_600_000, &lp("f"), &lp("m"), PredictionId(1))
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadySettled(BetId(1))));
    assert_eq!(ledger, before);
    assert_eq!(ledger.get_pool_stats().total_liquidity, 1_000_000_000);
}

#[test]
fn test_snapshot_serializes() {
    let mut ledger = Ledger::new();
    ledger.deposit(lp("alice"), 10_000_000).unwrap();

    let json = serde_json::to_value(ledger.snapshot()).unwrap();
    assert_eq!(json["pool"]["total_liquidity"], 10_000_000);
    assert_eq!(json["bets"]["active_bets"], 0);
}
