//! Indicator implementations.
//!
//! Indicators are pure functions of a bar history. [`Supertrend::compute`]
//! returns a typed series; the [`Indicator`] trait exposes the flat
//! NaN-padded view shared by every indicator.

pub mod atr;
pub mod params;
pub mod supertrend;

pub use atr::{true_range, wilder_smooth, Atr};
pub use params::{IndicatorParams, ParamsError};
pub use supertrend::{
    Direction, IndicatorError, Supertrend, SupertrendPoint, SupertrendSeries, SupertrendState,
};

use crate::domain::Bar;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warm-up).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "atr_14", "supertrend_10_3").
    fn name(&self) -> &str;

    /// Number of leading bars without a valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute_values(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create bars from `(open, high, low, close)` tuples on consecutive days.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
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
