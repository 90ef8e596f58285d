//! Ticker universe: where the list of symbols to scan comes from.
//!
//! A universe is either a sector-organized TOML file, an explicit list, or
//! the remote constituents CSV (see `constituents`). Every source yields an
//! ordered, deduplicated list of symbols.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("ticker universe source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("read universe file {path}: {message}")]
    Io { path: String, message: String },

    #[error("parse universe: {0}")]
    Parse(String),
}

/// Source of the symbols to scan.
pub trait UniverseProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Ordered, deduplicated symbols. An empty list is valid: nothing to scan.
    fn load(&self) -> Result<Vec<String>, UniverseError>;
}

/// Trim, drop blanks and keep the first occurrence of each symbol.
pub fn dedupe_symbols<I, S>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/// An explicit ticker list (e.g. from the command line).
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    symbols: Vec<String>,
}

impl StaticUniverse {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symbols: dedupe_symbols(symbols),
        }
    }
}

impl UniverseProvider for StaticUniverse {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self) -> Result<Vec<String>, UniverseError> {
        Ok(self.symbols.clone())
    }
}

/// Sector-organized universe stored as TOML:
///
/// ```toml
/// [sectors]
/// Technology = ["AAPL", "MSFT"]
/// ETFs = ["SPY"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Universe {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl Universe {
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|e| UniverseError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        toml::from_str(content).map_err(|e| UniverseError::Parse(e.to_string()))
    }

    /// All tickers across sectors, in sector-name order, deduplicated.
    pub fn all_tickers(&self) -> Vec<String> {
        dedupe_symbols(self.sectors.values().flatten())
    }
}

impl UniverseProvider for Universe {
    fn name(&self) -> &str {
        "sector_file"
    }

    fn load(&self) -> Result<Vec<String>, UniverseError> {
        let tickers = self.all_tickers();
        tracing::debug!(
            sectors = self.sectors.len(),
            tickers = tickers.len(),
            "loaded sector universe"
        );
        Ok(tickers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_tickers_dedupes_across_sectors() {
        let u = Universe::from_toml(
            r#"
            [sectors]
            Alpha = ["SPY", "AAPL"]
            Beta = ["AAPL", "QQQ"]
            "#,
        )
        .unwrap();
        assert_eq!(u.all_tickers(), vec!["SPY", "AAPL", "QQQ"]);
        assert_eq!(u.load().unwrap(), u.all_tickers());
    }

    #[test]
    fn empty_sector_table_is_an_empty_universe() {
        let u = Universe::from_toml("[sectors]").unwrap();
        assert!(u.load().unwrap().is_empty());
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            Universe::from_toml("sectors = 3"),
            Err(UniverseError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Universe::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, UniverseError::Io { .. }));
    }

    #[test]
    fn static_universe_preserves_order_and_dedupes() {
        let u = StaticUniverse::new(["MSFT", " AAPL ", "MSFT", "", "SPY"]);
        assert_eq!(u.load().unwrap(), vec!["MSFT", "AAPL", "SPY"]);
    }
}
