//! Crossover detection on the last two bars.

use serde::{Deserialize, Serialize};

use crate::indicators::SupertrendSeries;

/// Which way price crossed the indicator between the previous and latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crossover {
    Up,
    Down,
    None,
}

/// Trailing `(prev_close, prev_value, close, value)` when both positions are
/// defined and the slices line up.
fn last_two(closes: &[f64], values: &[Option<f64>]) -> Option<(f64, f64, f64, f64)> {
    let n = closes.len();
    if n < 2 || values.len() != n {
        return None;
    }
    let prev_value = values[n - 2]?;
    let value = values[n - 1]?;
    let (prev_close, close) = (closes[n - 2], closes[n - 1]);
    [prev_close, prev_value, close, value]
        .iter()
        .all(|v| v.is_finite())
        .then_some((prev_close, prev_value, close, value))
}

/// True iff the previous close was below the indicator and the latest close
/// is strictly above it.
pub fn crossed_up(closes: &[f64], values: &[Option<f64>]) -> bool {
    last_two(closes, values).is_some_and(|(prev_close, prev_value, close, value)| {
        prev_close < prev_value && close > value
    })
}

/// Mirror of [`crossed_up`]: previous close above, latest close strictly below.
pub fn crossed_down(closes: &[f64], values: &[Option<f64>]) -> bool {
    last_two(closes, values).is_some_and(|(prev_close, prev_value, close, value)| {
        prev_close > prev_value && close < value
    })
}

/// Classify the latest bar against a Supertrend series.
pub fn detect(closes: &[f64], series: &SupertrendSeries) -> Crossover {
    let values = series.values();
    if crossed_up(closes, &values) {
        Crossover::Up
    } else if crossed_down(closes, &values) {
        Crossover::Down
    } else {
        Crossover::None
    }
}
