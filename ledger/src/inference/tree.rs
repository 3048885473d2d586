//! Fixed two-level decision tree
//!
//! `weights[0]` splits on payload, `weights[1]` and `weights[2]` split the
//! high and low branches on quality score. Splits are strict `>`.

use serde::{Deserialize, Serialize};

use crate::constants::{SCALE, TREE_LEAF_CONFIDENCE};
use crate::error::Result;
use crate::fixed::{add_signed, clamp};
use crate::types::{Algorithm, FeedPayload, Model, Signal};

use super::{features, Prediction};

/// Leaf reached by a tree evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreePath {
    HighPayloadHighQuality,
    HighPayloadLowQuality,
    LowPayloadHighQuality,
    LowPayloadLowQuality,
}

impl TreePath {
    pub fn direction(&self) -> bool {
        matches!(
            self,
            TreePath::HighPayloadHighQuality | TreePath::LowPayloadHighQuality
        )
    }

    pub fn leaf_confidence(&self) -> u64 {
        match self {
            TreePath::HighPayloadHighQuality => TREE_LEAF_CONFIDENCE[0],
            TreePath::HighPayloadLowQuality => TREE_LEAF_CONFIDENCE[1],
            TreePath::LowPayloadHighQuality => TREE_LEAF_CONFIDENCE[2],
            TreePath::LowPayloadLowQuality => TREE_LEAF_CONFIDENCE[3],
        }
    }
}

pub fn walk(payload: i64, quality: i64, model: &Model) -> TreePath {
    if payload > model.weights[0] {
        if quality > model.weights[1] {
            TreePath::HighPayloadHighQuality
        } else {
            TreePath::HighPayloadLowQuality
        }
    } else if quality > model.weights[2] {
        TreePath::LowPayloadHighQuality
    } else {
        TreePath::LowPayloadLowQuality
    }
}

pub fn infer(feed: &FeedPayload, model: &Model) -> Result<Prediction> {
    let [payload, quality, _, _] = features(feed)?;
    let path = walk(payload, quality, model);

    let adjusted = add_signed(path.leaf_confidence() as i64, model.bias)?;
    let confidence = clamp(adjusted, 0, SCALE as i64) as u64;

    Ok(Prediction {
        signal: Signal {
            score: confidence as i64,
            confidence,
            category: model.category,
            direction: path.direction(),
        },
        algorithm: Algorithm::Tree,
        probability: None,
        path: Some(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn model(bias: i64) -> Model {
        Model {
            weights: [1_500_000, 900_000, 700_000, 0],
            bias,
            threshold: 1_000_000,
            category: Category(1),
            algorithm: Algorithm::Tree,
        }
    }

    fn run(payload: u64, quality: u64, bias: i64) -> Prediction {
        let feed = FeedPayload::new(payload, quality, Category(1)).unwrap();
        infer(&feed, &model(bias)).unwrap()
    }

    #[test]
    fn test_all_four_leaves() {
        let p = run(1_800_000, 950_000, 100_000);
        assert_eq!(p.path, Some(TreePath::HighPayloadHighQuality));
        assert!(p.signal.direction);
        assert_eq!(p.signal.confidence, 900_000);

        let p = run(1_800_000, 800_000, 100_000);
        assert_eq!(p.path, Some(TreePath::HighPayloadLowQuality));
        assert!(!p.signal.direction);
        assert_eq!(p.signal.confidence, 700_000);

        let p = run(1_200_000, 800_000, 100_000);
        assert_eq!(p.path, Some(TreePath::LowPayloadHighQuality));
        assert!(p.signal.direction);
        assert_eq!(p.signal.confidence, 800_000);

        let p = run(1_200_000, 600_000, 100_000);
        assert_eq!(p.path, Some(TreePath::LowPayloadLowQuality));
        assert!(!p.signal.direction);
        assert_eq!(p.signal.confidence, SCALE);
    }

    #[test]
    fn test_splits_are_strict() {
        // payload == weights[0] goes low; quality == weights[2] goes low
        let p = run(1_500_000, 700_000, 0);
        assert_eq!(p.path, Some(TreePath::LowPayloadLowQuality));

        let p = run(1_500_000, 900_000, 0);
        assert_eq!(p.path, Some(TreePath::LowPayloadHighQuality));
        assert_eq!(p.signal.confidence, 700_000);
    }

    #[test]
    fn test_negative_bias_clamps_at_zero() {
        let p = run(1_800_000, 800_000, -700_000);
        assert_eq!(p.signal.confidence, 0);
    }
}
