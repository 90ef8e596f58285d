//! Serializable scan configuration.
//!
//! Loaded from TOML; every field has a default so a partial file (or none at
//! all) is valid. CLI flags override values after loading.
//!
//! ```toml
//! [indicator]
//! period = 10
//! multiplier = 3.0
//!
//! [scan]
//! lookback = "1y"
//! concurrency = 8
//! fetch_timeout_secs = 30   # 0 waits on the provider with no deadline
//!
//! [universe]
//! constituents_url = "https://..."
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use screener_core::data::{Lookback, SP500_CONSTITUENTS_URL};
use screener_core::indicators::{IndicatorParams, ParamsError};

use crate::scan::ScanOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("parse config: {0}")]
    Parse(String),

    #[error("invalid indicator parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("concurrency must be >= 1")]
    ZeroConcurrency,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndicatorSection {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for IndicatorSection {
    fn default() -> Self {
        let params = IndicatorParams::default();
        Self {
            period: params.period(),
            multiplier: params.multiplier(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanSection {
    pub lookback: Lookback,
    pub concurrency: usize,
    /// Per-fetch deadline in seconds; `0` disables it.
    pub fetch_timeout_secs: u64,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            lookback: Lookback::default(),
            concurrency: 8,
            fetch_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UniverseSection {
    pub constituents_url: String,
    /// Sector TOML file; takes precedence over the constituents URL.
    pub file: Option<PathBuf>,
    /// Explicit tickers; take precedence over everything else.
    pub tickers: Vec<String>,
}

impl Default for UniverseSection {
    fn default() -> Self {
        Self {
            constituents_url: SP500_CONSTITUENTS_URL.to_string(),
            file: None,
            tickers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub indicator: IndicatorSection,
    pub scan: ScanSection,
    pub universe: UniverseSection,
}

impl ScanConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params()?;
        if self.scan.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    pub fn params(&self) -> Result<IndicatorParams, ConfigError> {
        Ok(IndicatorParams::new(
            self.indicator.period,
            self.indicator.multiplier,
        )?)
    }

    pub fn to_options(&self) -> Result<ScanOptions, ConfigError> {
        self.validate()?;
        Ok(ScanOptions {
            params: self.params()?,
            lookback: self.scan.lookback,
            concurrency: self.scan.concurrency,
            fetch_timeout: (self.scan.fetch_timeout_secs > 0)
                .then(|| Duration::from_secs(self.scan.fetch_timeout_secs)),
            as_of: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = ScanConfig::from_toml("").unwrap();
        assert_eq!(config, ScanConfig::default());
        assert_eq!(config.indicator.period, 10);
        assert_eq!(config.indicator.multiplier, 3.0);
        assert_eq!(config.scan.lookback.to_string(), "1y");
        assert_eq!(config.universe.constituents_url, SP500_CONSTITUENTS_URL);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ScanConfig::from_toml(
            r#"
            [indicator]
            period = 14

            [scan]
            lookback = "6mo"
            fetch_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.indicator.period, 14);
        assert_eq!(config.indicator.multiplier, 3.0);
        assert_eq!(config.scan.concurrency, 8);

        let options = config.to_options().unwrap();
        assert_eq!(options.params.period(), 14);
        assert_eq!(options.lookback.to_string(), "6mo");
        assert_eq!(options.fetch_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ScanConfig::from_toml("[indicator]\nperiod = 0"),
            Err(ConfigError::Params(ParamsError::InvalidPeriod(0)))
        ));
        assert!(matches!(
            ScanConfig::from_toml("[indicator]\nmultiplier = -2.0"),
            Err(ConfigError::Params(_))
        ));
        assert!(matches!(
            ScanConfig::from_toml("[scan]\nconcurrency = 0"),
            Err(ConfigError::ZeroConcurrency)
        ));
        assert!(matches!(
            ScanConfig::from_toml("[scan]\nlookback = \"forever\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_fetch_timeout_means_no_deadline() {
        let config = ScanConfig::from_toml("[scan]\nfetch_timeout_secs = 0").unwrap();
        assert_eq!(config.scan.fetch_timeout_secs, 0);
        assert_eq!(config.to_options().unwrap().fetch_timeout, None);

        let defaults = ScanConfig::default().to_options().unwrap();
        assert_eq!(defaults.fetch_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.toml");
        std::fs::write(
            &path,
            r#"
            [scan]
            concurrency = 4

            [universe]
            file = "sectors.toml"
            tickers = ["AAPL", "MSFT"]
            "#,
        )
        .unwrap();

        let config = ScanConfig::from_file(&path).unwrap();
        assert_eq!(config.scan.concurrency, 4);
        assert_eq!(config.universe.file, Some(PathBuf::from("sectors.toml")));
        assert_eq!(config.universe.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(config.indicator, IndicatorSection::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            ScanConfig::from_file(Path::new("/no/such/scan.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
