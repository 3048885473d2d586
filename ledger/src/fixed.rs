//! Fixed-point arithmetic kernel
//!
//! Every value is an integer scaled by [`SCALE`]. Division truncates toward
//! zero for unsigned values and floors for signed ones. Products go through
//! a 128-bit intermediate before narrowing back.

use crate::constants::SCALE;
use crate::error::ArithmeticError;

type MathResult<T> = std::result::Result<T, ArithmeticError>;

fn narrow(value: u128) -> MathResult<u64> {
    u64::try_from(value).map_err(|_| ArithmeticError::Overflow)
}

fn narrow_signed(value: i128) -> MathResult<i64> {
    i64::try_from(value).map_err(|_| ArithmeticError::Overflow)
}

/// `a + b`, failing past `u64::MAX`
pub fn add(a: u64, b: u64) -> MathResult<u64> {
    a.checked_add(b).ok_or(ArithmeticError::Overflow)
}

/// `a - b`, failing when `a < b`
pub fn sub(a: u64, b: u64) -> MathResult<u64> {
    a.checked_sub(b).ok_or(ArithmeticError::Underflow)
}

/// `|a - b|`, never fails
pub fn abs_diff(a: u64, b: u64) -> u64 {
    a.abs_diff(b)
}

/// `(a * b) / SCALE`
pub fn mul(a: u64, b: u64) -> MathResult<u64> {
    narrow(a as u128 * b as u128 / SCALE as u128)
}

/// `(a * SCALE) / b`
pub fn div(a: u64, b: u64) -> MathResult<u64> {
    if b == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    narrow(a as u128 * SCALE as u128 / b as u128)
}

/// `floor(a * b / c)` without intermediate overflow
pub fn mul_div(a: u64, b: u64, c: u64) -> MathResult<u64> {
    if c == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    narrow(a as u128 * b as u128 / c as u128)
}

/// `floor(a * pct / 100)` for whole-number percentages
pub fn percent_of(a: u64, pct: u64) -> MathResult<u64> {
    mul_div(a, pct, 100)
}

/// `Σ mul(weights[i], inputs[i])`
pub fn weighted_sum(weights: &[u64; 4], inputs: &[u64; 4]) -> MathResult<u64> {
    weights
        .iter()
        .zip(inputs.iter())
        .try_fold(0u64, |acc, (w, x)| add(acc, mul(*w, *x)?))
}

/// Inclusive threshold test
pub fn activation(x: u64, threshold: u64) -> bool {
    x >= threshold
}

pub fn activation_signed(x: i64, threshold: i64) -> bool {
    x >= threshold
}

pub fn clamp(value: i64, min: i64, max: i64) -> i64 {
    value.max(min).min(max)
}

pub fn add_signed(a: i64, b: i64) -> MathResult<i64> {
    a.checked_add(b).ok_or(ArithmeticError::Overflow)
}

/// Signed `(a * b) / SCALE`, flooring toward negative infinity
pub fn mul_signed(a: i64, b: i64) -> MathResult<i64> {
    narrow_signed((a as i128 * b as i128).div_euclid(SCALE as i128))
}

/// Signed `Σ mul(weights[i], inputs[i])`
pub fn weighted_sum_signed(weights: &[i64; 4], inputs: &[i64; 4]) -> MathResult<i64> {
    weights
        .iter()
        .zip(inputs.iter())
        .try_fold(0i64, |acc, (w, x)| add_signed(acc, mul_signed(*w, *x)?))
}
