//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! Smoothing is Wilder's: `ATR[i] = (ATR[i-1] * (P-1) + TR[i]) / P`,
//! seeded at index P-1 with the simple mean of TR[0..P].

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// Compute the True Range series from bars.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let range = bar.high - bar.low;
            if i == 0 {
                return range;
            }
            let pc = bars[i - 1].close;
            range.max((bar.high - pc).abs()).max((bar.low - pc).abs())
        })
        .collect()
}

/// Wilder smoothing over `period` values.
///
/// Output is NaN before index `period - 1`. A NaN input poisons every value
/// from its position onward, so callers can spot it with a single check.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = seed;

    let weight = (period - 1) as f64;
    let mut prev = seed;
    for i in period..n {
        let smoothed = (prev * weight + values[i]) / period as f64;
        result[i] = smoothed;
        prev = smoothed;
    }

    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute_values(&self, bars: &[Bar]) -> Vec<f64> {
        wilder_smooth(&true_range(bars), self.period)
    }
}
