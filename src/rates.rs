//! Derived ratios and percentages.
//!
//! Every rate in a report goes through [`ratio`], which returns `0.0` for a
//! zero denominator instead of NaN or infinity.

use serde::{Deserialize, Serialize};

/// Rounding applied to a displayed percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Whole numbers, for progress bars.
    Integer,
    /// One decimal place, for displayed rates.
    #[default]
    OneDecimal,
}

/// `numerator / denominator`, or `0.0` when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() { value } else { 0.0 }
}

/// `ratio * 100`, rounded per `precision`.
pub fn percentage(numerator: f64, denominator: f64, precision: Precision) -> f64 {
    let value = ratio(numerator, denominator) * 100.0;
    match precision {
        Precision::Integer => value.round(),
        Precision::OneDecimal => round_to(value, 1),
    }
}

/// Percentage of two counts.
pub fn count_percentage(numerator: usize, denominator: usize, precision: Precision) -> f64 {
    percentage(numerator as f64, denominator as f64, precision)
}

/// Mean of `total` over `entity_count` entities, zero when there are none.
pub fn average_per_entity(total: f64, entity_count: usize) -> f64 {
    ratio(total, entity_count as f64)
}

/// Achieved share of a target, as a percentage.
pub fn achievement(actual: f64, target: f64, precision: Precision) -> f64 {
    percentage(actual, target, precision)
}

/// Round to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}
