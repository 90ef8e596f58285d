//! Scan orchestrator: evaluate many tickers with per-ticker failure isolation.
//!
//! Each ticker is an independent unit: fetch bars for the lookback window,
//! run the Supertrend, check for a cross up on the latest bar. Nothing is
//! shared between tickers except the read-only provider and parameters, so
//! evaluations run on a private, bounded rayon pool. Results come back in
//! input order regardless of completion order.
//!
//! Failures (fetch errors, timeouts, short histories, malformed bars, even a
//! panicking provider) are recorded on the ticker's outcome and never abort
//! the batch. Only the ticker universe failing to load is a scan-level error.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use screener_core::data::{DataError, DataProvider, Lookback, UniverseError, UniverseProvider};
use screener_core::domain::BarSeries;
use screener_core::indicators::{IndicatorError, IndicatorParams, Supertrend};
use screener_core::signals::crossed_up;

use crate::progress::ScanProgress;

// ─── Options ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub params: IndicatorParams,
    pub lookback: Lookback,
    /// Maximum tickers evaluated at once, and the cap on provider calls in
    /// flight. 1 runs on the calling thread.
    pub concurrency: usize,
    /// Per-fetch deadline; `None` waits for the provider. A fetch that
    /// misses it keeps its concurrency slot until the provider returns.
    pub fetch_timeout: Option<Duration>,
    /// Last day of the lookback window; `None` means today (local time).
    pub as_of: Option<NaiveDate>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            params: IndicatorParams::default(),
            lookback: Lookback::default(),
            concurrency: 8,
            fetch_timeout: Some(Duration::from_secs(30)),
            as_of: None,
        }
    }
}

impl ScanOptions {
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        let end = self
            .as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        self.lookback.date_range(end)
    }
}

// ─── Outcomes ────────────────────────────────────────────────────────

/// Why a ticker produced no classification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickerFailure {
    #[error("fetch failed: {0}")]
    Fetch(DataError),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("insufficient data: need {needed} bars, got {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("computation failed: {0}")]
    Computation(String),
}

impl TickerFailure {
    /// Computation failures may indicate a bug rather than a data miss.
    pub fn is_computation(&self) -> bool {
        matches!(self, TickerFailure::Computation(_))
    }
}

impl From<IndicatorError> for TickerFailure {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::InsufficientData { needed, available } => {
                TickerFailure::InsufficientData { needed, available }
            }
            other => TickerFailure::Computation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    /// Close crossed above the Supertrend on the latest bar.
    Crossed,
    /// Evaluated; no cross on the latest bar.
    NoCross,
    /// Could not be evaluated; treated as no signal.
    Failed(TickerFailure),
    /// Not started because the scan was cancelled.
    Skipped,
}

impl TickerOutcome {
    pub fn is_signal(&self) -> bool {
        matches!(self, TickerOutcome::Crossed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerResult {
    pub symbol: String,
    pub outcome: TickerOutcome,
}

/// Outcome counts for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub crossed: usize,
    pub no_cross: usize,
    pub fetch_failures: usize,
    pub insufficient_data: usize,
    pub computation_failures: usize,
    pub skipped: usize,
}

impl ScanSummary {
    pub fn evaluated(&self) -> usize {
        self.total - self.skipped
    }

    pub fn failed(&self) -> usize {
        self.fetch_failures + self.insufficient_data + self.computation_failures
    }

    fn count(&mut self, outcome: &TickerOutcome) {
        self.total += 1;
        match outcome {
            TickerOutcome::Crossed => self.crossed += 1,
            TickerOutcome::NoCross => self.no_cross += 1,
            TickerOutcome::Skipped => self.skipped += 1,
            TickerOutcome::Failed(TickerFailure::Fetch(_) | TickerFailure::Timeout(_)) => {
                self.fetch_failures += 1
            }
            TickerOutcome::Failed(TickerFailure::InsufficientData { .. }) => {
                self.insufficient_data += 1
            }
            TickerOutcome::Failed(TickerFailure::Computation(_)) => self.computation_failures += 1,
        }
    }
}

/// Final result of a scan, one entry per input ticker in input order.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub results: Vec<TickerResult>,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl ScanReport {
    fn empty() -> Self {
        Self {
            results: Vec::new(),
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Tickers that crossed up, in input order.
    pub fn crossed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.outcome.is_signal())
            .map(|r| r.symbol.as_str())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &TickerFailure)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            TickerOutcome::Failed(f) => Some((r.symbol.as_str(), f)),
            _ => None,
        })
    }

    pub fn summary(&self) -> ScanSummary {
        let mut summary = ScanSummary::default();
        for r in &self.results {
            summary.count(&r.outcome);
        }
        summary
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("could not load ticker universe: {0}")]
    UniverseUnavailable(#[from] UniverseError),

    #[error("failed to build scan worker pool: {0}")]
    WorkerPool(String),
}

// ─── Single ticker ───────────────────────────────────────────────────

/// Run the Supertrend and crossover check on an already-fetched series.
///
/// Requires `period + 2` bars: the seed bar plus two trailing defined points.
pub fn evaluate_series(
    series: &BarSeries,
    params: &IndicatorParams,
) -> Result<bool, TickerFailure> {
    let needed = params.min_bars_for_signal();
    if series.len() < needed {
        return Err(TickerFailure::InsufficientData {
            needed,
            available: series.len(),
        });
    }

    let supertrend = Supertrend::new(*params).compute(series.bars())?;
    Ok(crossed_up(&series.closes(), &supertrend.values()))
}

/// Counting limiter over provider calls. A fetch abandoned on timeout keeps
/// its slot on the helper thread until the provider returns, so at most
/// `limit` calls are in flight.
struct FetchSlots {
    used: Mutex<usize>,
    freed: Condvar,
    limit: usize,
}

impl FetchSlots {
    fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            used: Mutex::new(0),
            freed: Condvar::new(),
            limit: limit.max(1),
        })
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        // The guarded counter is updated in one step and cannot be left torn.
        self.used.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Block until a slot is free, then hold it until the guard drops.
    fn acquire(self: &Arc<Self>) -> FetchSlot {
        let mut used = self.lock();
        while *used >= self.limit {
            used = self
                .freed
                .wait(used)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *used += 1;
        FetchSlot(Arc::clone(self))
    }
}

struct FetchSlot(Arc<FetchSlots>);

impl Drop for FetchSlot {
    fn drop(&mut self) {
        let mut used = self.0.lock();
        *used = used.saturating_sub(1);
        self.0.freed.notify_one();
    }
}

/// Fetch on a helper thread so a hung provider costs at most `timeout`.
/// A timed-out fetch keeps running detached, holding its slot; its result
/// is dropped.
fn fetch_bars(
    provider: &Arc<dyn DataProvider>,
    slots: &Arc<FetchSlots>,
    symbol: &str,
    (start, end): (NaiveDate, NaiveDate),
    timeout: Option<Duration>,
) -> Result<BarSeries, TickerFailure> {
    if !provider.is_available() {
        return Err(TickerFailure::Fetch(DataError::Unavailable {
            provider: provider.name().to_string(),
        }));
    }

    let slot = slots.acquire();
    let Some(timeout) = timeout else {
        return provider
            .fetch(symbol, start, end)
            .map_err(TickerFailure::Fetch);
    };

    let (tx, rx) = mpsc::channel();
    let worker_provider = Arc::clone(provider);
    let owned_symbol = symbol.to_string();
    thread::Builder::new()
        .name(format!("fetch-{symbol}"))
        .spawn(move || {
            let _slot = slot;
            let _ = tx.send(worker_provider.fetch(&owned_symbol, start, end));
        })
        .map_err(|e| TickerFailure::Fetch(DataError::Other(format!("spawn fetch thread: {e}"))))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map_err(TickerFailure::Fetch),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(TickerFailure::Timeout(timeout)),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(TickerFailure::Computation(
            "provider panicked during fetch".into(),
        )),
    }
}

fn evaluate_ticker(
    provider: &Arc<dyn DataProvider>,
    slots: &Arc<FetchSlots>,
    symbol: &str,
    options: &ScanOptions,
    range: (NaiveDate, NaiveDate),
) -> TickerOutcome {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        let series = fetch_bars(provider, slots, symbol, range, options.fetch_timeout)?;
        evaluate_series(&series, &options.params)
    }));

    let outcome = match attempt {
        Ok(Ok(true)) => TickerOutcome::Crossed,
        Ok(Ok(false)) => TickerOutcome::NoCross,
        Ok(Err(failure)) => TickerOutcome::Failed(failure),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            TickerOutcome::Failed(TickerFailure::Computation(format!("panicked: {message}")))
        }
    };

    match &outcome {
        TickerOutcome::Failed(failure) if failure.is_computation() => {
            tracing::warn!(symbol, error = %failure, "computation failure");
        }
        TickerOutcome::Failed(TickerFailure::Fetch(err)) => {
            tracing::debug!(symbol, kind = ?err.kind(), error = %err, "no signal: fetch failed");
        }
        TickerOutcome::Failed(failure) => {
            tracing::debug!(symbol, error = %failure, "no signal: ticker could not be evaluated");
        }
        TickerOutcome::Crossed => tracing::debug!(symbol, "crossed above supertrend"),
        _ => {}
    }
    outcome
}

// ─── Batch ───────────────────────────────────────────────────────────

/// Scan `tickers` and return the full report. No progress hook, no cancellation.
pub fn scan(
    tickers: &[String],
    provider: Arc<dyn DataProvider>,
    options: &ScanOptions,
) -> Result<ScanReport, ScanError> {
    scan_with(tickers, provider, options, None, None)
}

/// Scan `tickers` with an optional progress hook and cooperative cancellation.
///
/// Once `cancel` is set, tickers that have not started are marked `Skipped`;
/// in-flight tickers finish normally.
pub fn scan_with(
    tickers: &[String],
    provider: Arc<dyn DataProvider>,
    options: &ScanOptions,
    progress: Option<&dyn ScanProgress>,
    cancel: Option<&AtomicBool>,
) -> Result<ScanReport, ScanError> {
    let start_time = Instant::now();
    let total = tickers.len();
    let range = options.date_range();
    let concurrency = options.concurrency.max(1);

    tracing::info!(
        tickers = total,
        period = options.params.period(),
        multiplier = options.params.multiplier(),
        lookback = %options.lookback,
        concurrency,
        provider = provider.name(),
        "starting supertrend scan"
    );

    let was_cancelled = AtomicBool::new(false);
    let completed = AtomicUsize::new(0);
    let slots = FetchSlots::new(concurrency);

    let run_one = |index: usize, symbol: &String| -> TickerResult {
        if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            was_cancelled.store(true, Ordering::Relaxed);
            return TickerResult {
                symbol: symbol.clone(),
                outcome: TickerOutcome::Skipped,
            };
        }

        if let Some(p) = progress {
            p.on_start(symbol, index, total);
        }
        let outcome = evaluate_ticker(&provider, &slots, symbol, options, range);
        completed.fetch_add(1, Ordering::Relaxed);
        if let Some(p) = progress {
            p.on_complete(symbol, index, total, &outcome);
        }

        TickerResult {
            symbol: symbol.clone(),
            outcome,
        }
    };

    let results: Vec<TickerResult> = if concurrency == 1 {
        tickers
            .iter()
            .enumerate()
            .map(|(i, s)| run_one(i, s))
            .collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("scan-worker-{i}"))
            .build()
            .map_err(|e| ScanError::WorkerPool(e.to_string()))?;
        // Indexed collect keeps input order.
        pool.install(|| {
            tickers
                .par_iter()
                .enumerate()
                .map(|(i, s)| run_one(i, s))
                .collect()
        })
    };

    let report = ScanReport {
        results,
        cancelled: was_cancelled.load(Ordering::Relaxed),
        elapsed: start_time.elapsed(),
    };

    let summary = report.summary();
    if let Some(p) = progress {
        p.on_scan_complete(&summary);
    }
    tracing::info!(
        evaluated = completed.load(Ordering::Relaxed),
        crossed = summary.crossed,
        fetch_failures = summary.fetch_failures,
        insufficient_data = summary.insufficient_data,
        computation_failures = summary.computation_failures,
        skipped = summary.skipped,
        cancelled = report.cancelled,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "scan finished"
    );

    Ok(report)
}

/// Load the universe, then scan it. A universe failure is the one error
/// surfaced to the caller; an empty universe yields an empty report.
pub fn run_scan(
    universe: &dyn UniverseProvider,
    provider: Arc<dyn DataProvider>,
    options: &ScanOptions,
    progress: Option<&dyn ScanProgress>,
    cancel: Option<&AtomicBool>,
) -> Result<ScanReport, ScanError> {
    let tickers = universe.load().map_err(|e| {
        tracing::error!(universe = universe.name(), error = %e, "ticker universe unavailable");
        ScanError::UniverseUnavailable(e)
    })?;

    if tickers.is_empty() {
        tracing::info!(universe = universe.name(), "ticker universe is empty, nothing to scan");
        return Ok(ScanReport::empty());
    }

    scan_with(&tickers, provider, options, progress, cancel)
}
