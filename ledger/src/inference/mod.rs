//! Inference / scoring engine
//!
//! Maps a feeder payload and a trained model to a directional [`Signal`].
//! Every algorithm sees the same feature vector:
//! `[payload, quality_score, ONE, HALF]`.

pub mod linear;
pub mod logistic;
pub mod tree;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{HALF, ONE};
use crate::error::{LedgerError, Result};
use crate::types::{Algorithm, FeedPayload, Model, Signal};

pub use tree::TreePath;

/// Inference output plus the algorithm-specific trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub signal: Signal,
    pub algorithm: Algorithm,

    /// Sigmoid output, logistic models only
    pub probability: Option<u64>,

    /// Leaf reached, tree models only
    pub path: Option<TreePath>,
}

/// Build the fixed four-element feature vector
pub fn features(feed: &FeedPayload) -> Result<[i64; 4]> {
    feed.validate()?;
    Ok([
        feed.payload as i64,
        feed.quality_score as i64,
        ONE as i64,
        HALF as i64,
    ])
}

/// Stateless scoring engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceEngine;

impl InferenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score `feed` with `model`, routing on the model's algorithm
    pub fn infer(&self, feed: &FeedPayload, model: &Model) -> Result<Prediction> {
        if feed.category != model.category {
            return Err(LedgerError::CategoryMismatch {
                data: feed.category.0,
                model: model.category.0,
            });
        }

        let prediction = match model.algorithm {
            Algorithm::Linear => linear::infer(feed, model)?,
            Algorithm::Logistic => logistic::infer(feed, model)?,
            Algorithm::Tree => tree::infer(feed, model)?,
        };

        debug!(
            algorithm = ?prediction.algorithm,
            score = prediction.signal.score,
            confidence = prediction.signal.confidence,
            direction = prediction.signal.direction,
            "Inference complete"
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn model(algorithm: Algorithm, category: u32) -> Model {
        Model {
            weights: [600_000, 100_000, 200_000, 100_000],
            bias: 100_000,
            threshold: 1_000_000,
            category: Category(category),
            algorithm,
        }
    }

    #[test]
    fn test_feature_vector() {
        let feed = FeedPayload::new(1_500_000, 900_000, Category(1)).unwrap();
        assert_eq!(features(&feed).unwrap(), [1_500_000, 900_000, 1_000_000, 500_000]);
    }

    #[test]
    fn test_category_mismatch_for_every_algorithm() {
        let engine = InferenceEngine::new();
        let feed = FeedPayload::new(1_500_000, 900_000, Category(1)).unwrap();

        for algorithm in [Algorithm::Linear, Algorithm::Logistic, Algorithm::Tree] {
            let err = engine.infer(&feed, &model(algorithm, 2)).unwrap_err();
            assert!(matches!(err, LedgerError::CategoryMismatch { data: 1, model: 2 }));
        }
    }

    #[test]
    fn test_routes_on_algorithm() {
        let engine = InferenceEngine::new();
        let feed = FeedPayload::new(1_500_000, 900_000, Category(1)).unwrap();

        let linear = engine.infer(&feed, &model(Algorithm::Linear, 1)).unwrap();
        assert_eq!(linear.algorithm, Algorithm::Linear);
        assert!(linear.probability.is_none() && linear.path.is_none());

        let logistic = engine.infer(&feed, &model(Algorithm::Logistic, 1)).unwrap();
        assert!(logistic.probability.is_some());

        let tree = engine.infer(&feed, &model(Algorithm::Tree, 1)).unwrap();
        assert!(tree.path.is_some());
    }
}
