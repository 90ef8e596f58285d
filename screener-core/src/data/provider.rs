//! Bar history provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (Yahoo Finance, CSV
//! directory, in-memory) so the scanner can swap implementations and tests
//! can inject failures and latency.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::BarSeries;

/// Structured error types for bar fetches.
///
/// These are designed to be displayable in both CLI logs and scan reports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars for {symbol} in the requested window")]
    Empty { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("provider {provider} is not accepting requests")]
    Unavailable { provider: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Coarse failure classes a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchFailureKind {
    /// Unknown ticker.
    NotFound,
    /// Network or provider outage, throttling, format drift.
    SourceUnavailable,
    /// Ticker known, but no bars in the window.
    Empty,
}

impl DataError {
    pub fn kind(&self) -> FetchFailureKind {
        match self {
            DataError::SymbolNotFound { .. } => FetchFailureKind::NotFound,
            DataError::Empty { .. } => FetchFailureKind::Empty,
            _ => FetchFailureKind::SourceUnavailable,
        }
    }
}

/// Trait for bar history providers.
///
/// Implementations return daily bars for `[start, end]`, ordered by date.
/// They are shared across scan workers, hence `Send + Sync`.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a symbol over a date range (inclusive).
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<BarSeries, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    /// The scanner skips the fetch and records `DataError::Unavailable` when
    /// this returns false.
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_failure_class() {
        assert_eq!(
            DataError::SymbolNotFound {
                symbol: "ZZZZ".into()
            }
            .kind(),
            FetchFailureKind::NotFound
        );
        assert_eq!(
            DataError::Empty {
                symbol: "AAPL".into()
            }
            .kind(),
            FetchFailureKind::Empty
        );
        assert_eq!(
            DataError::NetworkUnreachable("dns".into()).kind(),
            FetchFailureKind::SourceUnavailable
        );
        assert_eq!(
            DataError::CircuitBreakerTripped.kind(),
            FetchFailureKind::SourceUnavailable
        );
        assert_eq!(
            DataError::Unavailable {
                provider: "yahoo_finance".into()
            }
            .kind(),
            FetchFailureKind::SourceUnavailable
        );
    }

    #[test]
    fn errors_render_for_logs() {
        let err = DataError::RateLimited {
            retry_after_secs: 60,
        };
        assert_eq!(err.to_string(), "rate limited by provider (retry after 60s)");
    }
}
