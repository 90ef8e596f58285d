//! BarSeries: the ordered daily history of one symbol.

use super::bar::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error(
        "bars for {symbol} are not in strictly increasing date order \
         at index {index} ({previous} then {current})"
    )]
    OutOfOrder {
        symbol: String,
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
}

/// Bars for a single symbol, strictly increasing by date.
///
/// The ordering invariant is checked once at construction; everything
/// downstream (true range, the Supertrend fold) relies on `bars[i - 1]`
/// being the previous trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        let symbol = symbol.into();
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(BarError::OutOfOrder {
                    symbol,
                    index: i + 1,
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    /// Sort by date and drop duplicate dates (keeping the last occurrence),
    /// then build the series. Used by providers whose source may be unordered.
    pub fn from_unsorted(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            bars: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
