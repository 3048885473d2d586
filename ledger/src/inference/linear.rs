//! Linear regression scoring

use crate::constants::SCALE;
use crate::error::{ArithmeticError, Result};
use crate::fixed::{activation_signed, add_signed, weighted_sum_signed};
use crate::types::{Algorithm, FeedPayload, Model, Signal};

use super::{features, Prediction};

/// `weighted_sum(weights, features) + bias`
pub fn score(feed: &FeedPayload, model: &Model) -> Result<i64> {
    let features = features(feed)?;
    let sum = weighted_sum_signed(&model.weights, &features)?;
    Ok(add_signed(sum, model.bias)?)
}

/// `|score - threshold| * SCALE / |threshold|`, clamped to `[0, SCALE]`.
///
/// A zero threshold yields full confidence.
pub fn confidence(score: i64, threshold: i64) -> Result<u64> {
    if threshold == 0 {
        return Ok(SCALE);
    }

    let distance = (score as i128 - threshold as i128).unsigned_abs();
    let scaled = distance
        .checked_mul(SCALE as u128)
        .ok_or(ArithmeticError::Overflow)?
        / threshold.unsigned_abs() as u128;

    Ok(scaled.min(SCALE as u128) as u64)
}

pub fn infer(feed: &FeedPayload, model: &Model) -> Result<Prediction> {
    let score = score(feed, model)?;
    let direction = activation_signed(score, model.threshold);
    let confidence = confidence(score, model.threshold)?;

    Ok(Prediction {
        signal: Signal {
            score,
            confidence,
            category: model.category,
            direction,
        },
        algorithm: Algorithm::Linear,
        probability: None,
        path: None,
    })
}
