//! Remote index-constituents universe (S&P 500 by default).
//!
//! Downloads a CSV with a `Symbol` column and rewrites share-class dots to
//! dashes (`BRK.B` -> `BRK-B`), the syntax the bar provider expects.

use std::time::Duration;

use super::universe::{dedupe_symbols, UniverseError, UniverseProvider};

pub const SP500_CONSTITUENTS_URL: &str =
    "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/master/data/constituents.csv";

pub struct ConstituentsCsv {
    url: String,
    client: reqwest::blocking::Client,
}

impl ConstituentsCsv {
    pub fn new(url: impl Into<String>) -> Result<Self, UniverseError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| UniverseError::SourceUnavailable(format!("build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn sp500() -> Result<Self, UniverseError> {
        Self::new(SP500_CONSTITUENTS_URL)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Extract symbols from constituents CSV text.
pub fn parse_constituents(content: &str) -> Result<Vec<String>, UniverseError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| UniverseError::Parse(format!("constituents header: {e}")))?;
    let column = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("symbol"))
        .ok_or_else(|| UniverseError::Parse("constituents CSV has no Symbol column".into()))?;

    let mut symbols = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| UniverseError::Parse(format!("constituents row: {e}")))?;
        if let Some(symbol) = record.get(column) {
            symbols.push(symbol.replace('.', "-"));
        }
    }
    Ok(dedupe_symbols(symbols))
}

impl UniverseProvider for ConstituentsCsv {
    fn name(&self) -> &str {
        "constituents_csv"
    }

    fn load(&self) -> Result<Vec<String>, UniverseError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| UniverseError::SourceUnavailable(format!("{}: {e}", self.url)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UniverseError::SourceUnavailable(format!(
                "HTTP {status} for {}",
                self.url
            )));
        }

        let body = resp
            .text()
            .map_err(|e| UniverseError::SourceUnavailable(format!("read body: {e}")))?;
        let symbols = parse_constituents(&body)?;
        tracing::debug!(url = %self.url, count = symbols.len(), "loaded constituents");
        Ok(symbols)
    }
}
