//! In-memory bar provider for tests, demos and offline replays.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, BarSeries};

/// Serves bars from a map keyed by symbol. Unknown symbols are `SymbolNotFound`;
/// a known symbol with no bars inside the requested window is `Empty`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    bars: HashMap<String, Vec<Bar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.bars.insert(symbol.into(), bars);
    }

    pub fn with_series(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.insert(symbol, bars);
        self
    }
}

impl DataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        let bars = self.bars.get(symbol).ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;

        let window: Vec<Bar> = bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        if window.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }

        BarSeries::new(symbol, window).map_err(|e| DataError::Other(e.to_string()))
    }
}
