//! Property tests for the ledger invariants

use proptest::prelude::*;

use oracle_ledger::constants::{MAX_REPUTATION, MIN_REPUTATION, SCALE};
use oracle_ledger::{
    BettingEngine, Category, LedgerError, LiquidityPool, ParticipantId, PredictionId,
    ProfitDistributor, Signal,
};

fn signal(confidence: u64) -> Signal {
    Signal {
        score: 0,
        confidence,
        category: Category(1),
        direction: true,
    }
}

proptest! {
    #[test]
    fn distribution_conserves_profit(
        amount in 0u64..1_000_000_000_000_000,
        wins in 0usize..15,
        losses in 0usize..8,
    ) {
        let mut distributor = ProfitDistributor::new();
        let data = ParticipantId::new("data");
        let model = ParticipantId::new("model");

        // move reputations around before the measured split
        for _ in 0..losses {
            distributor.penalize_failure(&data, &model, 0).unwrap();
        }
        for i in 0..wins {
            distributor.distribute_profit(1_000_000, &data, &model, PredictionId(i as u64)).unwrap();
        }

        let distribution = distributor
            .distribute_profit(amount, &data, &model, PredictionId(u64::MAX))
            .unwrap();
        prop_assert_eq!(distribution.total(), amount);
    }

    #[test]
    fn exposure_never_exceeds_cap(
        liquidity in 1_000_000u64..100_000_000_000_000,
        confidences in prop::collection::vec(0u64..=SCALE, 1..40),
    ) {
        let mut pool = LiquidityPool::new();
        pool.deposit(ParticipantId::new("lp"), liquidity).unwrap();
        let mut engine = BettingEngine::new();

        for confidence in confidences {
            let _ = engine.place_bet(&mut pool, signal(confidence), Category(1), 0, 0, 0);
            prop_assert!(engine.current_exposure() <= engine.max_exposure(&pool).unwrap());
        }
    }

    #[test]
    fn reputation_stays_bounded(outcomes in prop::collection::vec(any::<bool>(), 0..60)) {
        let mut distributor = ProfitDistributor::new();
        let data = ParticipantId::new("data");
        let model = ParticipantId::new("model");

        for (i, won) in outcomes.into_iter().enumerate() {
            if won {
                distributor.distribute_profit(5_000_000, &data, &model, PredictionId(i as u64)).unwrap();
            } else {
                distributor.penalize_failure(&data, &model, 5_000_000).unwrap();
            }
            for (_, record) in distributor.participants() {
                prop_assert!((MIN_REPUTATION..=MAX_REPUTATION).contains(&record.reputation));
            }
        }
    }

    #[test]
    fn deposit_withdraw_round_trip(
        earlier in prop::collection::vec(1_000_000u64..1_000_000_000_000, 0..10),
        amount in 1_000_000u64..1_000_000_000_000,
    ) {
        let mut pool = LiquidityPool::new();
        for (i, deposit) in earlier.iter().enumerate() {
            pool.deposit(ParticipantId::new(format!("lp-{}", i)), *deposit).unwrap();
        }

        let receipt = pool.deposit(ParticipantId::new("me"), amount).unwrap();
        prop_assert_eq!(pool.withdraw(receipt.share_id).unwrap(), amount);
        prop_assert_eq!(pool.outstanding_shares(), pool.total_shares() as u128);
    }

    #[test]
    fn deposit_withdraw_after_profit_never_pays_out_more(
        earlier in prop::collection::vec(1_000_000u64..1_000_000_000_000, 1..10),
        profit in 0u64..1_000_000_000_000_000,
        amount in 1_000_000u64..1_000_000_000_000,
    ) {
        let mut pool = LiquidityPool::new();
        for (i, deposit) in earlier.iter().enumerate() {
            pool.deposit(ParticipantId::new(format!("lp-{}", i)), *deposit).unwrap();
        }
        pool.record_profit(profit).unwrap();
        let liquidity = pool.total_liquidity() as u128;
        let shares = pool.total_shares() as u128;
        let before = pool.clone();

        match pool.deposit(ParticipantId::new("me"), amount) {
            Ok(receipt) => {
                prop_assert!(receipt.shares > 0);
                let withdrawn = pool.withdraw(receipt.share_id).unwrap();
                prop_assert!(withdrawn <= amount);
                // rounding costs strictly less than one share plus one unit
                prop_assert!(((amount - withdrawn) as u128) * shares < liquidity + shares);
            }
            Err(LedgerError::NoSharesMinted { .. }) => {
                prop_assert!((amount as u128) * shares < liquidity);
                prop_assert_eq!(&pool, &before);
            }
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        }
        prop_assert_eq!(pool.outstanding_shares(), pool.total_shares() as u128);
    }

    #[test]
    fn settlement_is_idempotent(confidence in 600_000u64..=SCALE, actual in 0u64..3_000_000) {
        let mut pool = LiquidityPool::new();
        pool.deposit(ParticipantId::new("lp"), 1_000_000_000).unwrap();
        let mut engine = BettingEngine::new();
        let position = engine
            .place_bet(&mut pool, signal(confidence), Category(1), 1_500_000, 1_000_000, 0)
            .unwrap();

        engine.settle_bet(&mut pool, position.id, actual).unwrap();
        let stats = pool.get_pool_stats();

        prop_assert!(engine.settle_bet(&mut pool, position.id, actual).is_err());
        prop_assert_eq!(pool.get_pool_stats(), stats);
    }
}
