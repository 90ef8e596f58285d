//! CSV directory provider: offline bars from `<dir>/<SYMBOL>.csv`.
//!
//! Expected header: `date,open,high,low,close,volume` with ISO dates.
//! Rows with an empty high/low/close are skipped.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, BarSeries};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| {
                DataError::Parse(format!("{} row {}: {e}", path.display(), line + 1))
            })?;
            let (Some(high), Some(low), Some(close)) = (row.high, row.low, row.close) else {
                continue;
            };
            bars.push(Bar {
                date: row.date,
                open: row.open.unwrap_or(close),
                high,
                low,
                close,
                volume: row.volume.unwrap_or(0),
            });
        }
        Ok(bars)
    }
}

impl DataProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv_dir"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        let path = self.symbol_path(symbol);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let bars: Vec<Bar> = Self::read_bars(&path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }

        Ok(BarSeries::from_unsorted(symbol, bars))
    }
}
