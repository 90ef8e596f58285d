//! Indicator parameters shared by every ticker in a scan.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error("period must be >= 1, got {0}")]
    InvalidPeriod(usize),

    #[error("multiplier must be positive and finite, got {0}")]
    InvalidMultiplier(f64),
}

/// Supertrend parameters: ATR window and band-width multiplier.
///
/// Construct through [`IndicatorParams::new`] so that `period >= 1` and
/// `multiplier > 0` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    period: usize,
    multiplier: f64,
}

impl IndicatorParams {
    pub fn new(period: usize, multiplier: f64) -> Result<Self, ParamsError> {
        if period < 1 {
            return Err(ParamsError::InvalidPeriod(period));
        }
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(ParamsError::InvalidMultiplier(multiplier));
        }
        Ok(Self { period, multiplier })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Index of the first bar with a defined indicator value.
    pub fn seed_index(&self) -> usize {
        self.period - 1
    }

    /// Minimum series length for the crossover check: the seed bar plus two
    /// trailing bars past the warm-up window.
    pub fn min_bars_for_signal(&self) -> usize {
        self.period + 2
    }
}

impl Default for IndicatorParams {
    /// Supertrend (10, 3).
    fn default() -> Self {
        Self {
            period: 10,
            multiplier: 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_ten_three() {
        let p = IndicatorParams::default();
        assert_eq!(p.period(), 10);
        assert_eq!(p.multiplier(), 3.0);
        assert_eq!(p.seed_index(), 9);
        assert_eq!(p.min_bars_for_signal(), 12);
    }

    #[test]
    fn rejects_zero_period() {
        assert_eq!(
            IndicatorParams::new(0, 3.0),
            Err(ParamsError::InvalidPeriod(0))
        );
    }

    #[test]
    fn rejects_bad_multiplier() {
        assert!(IndicatorParams::new(10, 0.0).is_err());
        assert!(IndicatorParams::new(10, -1.5).is_err());
        assert!(IndicatorParams::new(10, f64::NAN).is_err());
        assert!(IndicatorParams::new(10, f64::INFINITY).is_err());
    }

    #[test]
    fn period_one_is_allowed() {
        let p = IndicatorParams::new(1, 0.5).unwrap();
        assert_eq!(p.seed_index(), 0);
    }
}
