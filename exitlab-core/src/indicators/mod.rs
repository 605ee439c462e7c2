//! Volatility indicators.
//!
//! Indicators are pure functions: bar history in, numeric series out. They are
//! precomputed once before the bar walk and read by bar index. No value at bar
//! t may depend on bars after t.

pub mod atr;

pub use atr::{rolling_atr, true_range, Atr, DEFAULT_ATR_WINDOW};

use crate::domain::Bar;
use thiserror::Error;

/// Trait for indicators.
///
/// Takes a full bar series and returns an output series of the same length.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g. "atr_10").
    fn name(&self) -> &str;

    /// Number of leading bars whose output is not a full-window estimate.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("{indicator} window must be >= 1")]
    ZeroWindow { indicator: &'static str },
}

/// Build bars from (open, high, low, close) tuples, one hour apart.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::{TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(base + chrono::Duration::hours(i as i64), open, high, low, close)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
