//! Shared fixtures: a scripted bar provider and synthetic price paths.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use screener_core::data::{DataError, DataProvider};
use screener_core::domain::{Bar, BarSeries};

pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

pub fn date_of(index: usize) -> NaiveDate {
    base_date() + chrono::Duration::days(index as i64)
}

/// Bars on consecutive calendar days with `high = close + 1`, `low = close - 1`.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            date: date_of(i),
            open: c,
            high: c + 1.0,
            low: c - 1.0,
            close: c,
            volume: 10_000,
        })
        .collect()
}

/// Steady decline of 0.5/day from 300, then a +20 jump on the last bar.
///
/// With period 10 and multiplier 3 the trend turns down at bar 22, so any
/// `len >= 24` crosses up on its final bar.
pub fn crossing_series(len: usize) -> Vec<Bar> {
    let mut closes: Vec<f64> = (0..len - 1).map(|i| 300.0 - 0.5 * i as f64).collect();
    let last = *closes.last().unwrap();
    closes.push(last + 20.0);
    bars_from_closes(&closes)
}

/// Flat closes at 100: the trend stays up and never crosses.
pub fn flat_series(len: usize) -> Vec<Bar> {
    bars_from_closes(&vec![100.0; len])
}

pub enum Script {
    Bars(Vec<Bar>),
    Fail(DataError),
    Delayed(Duration, Vec<Bar>),
    Panic,
}

/// Provider whose behaviour per symbol is fixed up front. Counts fetches
/// and tracks the peak number of fetches in flight.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: HashMap<String, Script>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    unavailable: bool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, script: Script) -> Self {
        self.scripts.insert(symbol.to_string(), script);
        self
    }

    /// Report the provider as not accepting requests.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn serve(&self, symbol: &str, bars: &[Bar]) -> Result<BarSeries, DataError> {
        BarSeries::new(symbol, bars.to_vec()).map_err(|e| DataError::Other(e.to_string()))
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn fetch(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        match self.scripts.get(symbol) {
            None => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
            Some(Script::Bars(bars)) => self.serve(symbol, bars),
            Some(Script::Fail(err)) => Err(err.clone()),
            Some(Script::Delayed(delay, bars)) => {
                std::thread::sleep(*delay);
                self.serve(symbol, bars)
            }
            Some(Script::Panic) => panic!("scripted provider panic for {symbol}"),
        }
    }
}
