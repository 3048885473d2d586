//! Logistic regression scoring with a piecewise-linear sigmoid

use crate::constants::{HALF, SCALE, SIGMOID_SATURATION, SIGMOID_SLOPE_DIVISOR};
use crate::error::Result;
use crate::fixed::{abs_diff, clamp};
use crate::types::{Algorithm, FeedPayload, Model, Signal};

use super::{linear, Prediction};

/// `SCALE` from 6.0 upward, otherwise `clamp(0.5 + x / 12, 0, 1)`
pub fn sigmoid_approx(x: i64) -> u64 {
    if x >= SIGMOID_SATURATION {
        return SCALE;
    }
    let linear = HALF as i64 + x.div_euclid(SIGMOID_SLOPE_DIVISOR);
    clamp(linear, 0, SCALE as i64) as u64
}

pub fn infer(feed: &FeedPayload, model: &Model) -> Result<Prediction> {
    let score = linear::score(feed, model)?;
    let probability = sigmoid_approx(score);
    let direction = probability >= HALF;
    let confidence = abs_diff(probability, HALF).saturating_mul(2).min(SCALE);

    Ok(Prediction {
        signal: Signal {
            score,
            confidence,
            category: model.category,
            direction,
        },
        algorithm: Algorithm::Logistic,
        probability: Some(probability),
        path: None,
    })
}
