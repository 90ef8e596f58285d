//! Bar: one trading day of price data for a single symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar.
///
/// The Supertrend only reads `high`, `low` and `close`; `open` and `volume`
/// are carried because every provider supplies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any of the fields the indicator reads is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !self.high.is_finite() || !self.low.is_finite() || !self.close.is_finite()
    }

    /// Midpoint of the bar's range, `(high + low) / 2`.
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}
