//! Progress hooks for a running scan.
//!
//! Callbacks fire from worker threads, possibly concurrently and out of
//! input order. The final [`ScanReport`](crate::ScanReport) is the only
//! ordered view.

use crate::scan::{ScanSummary, TickerOutcome};

pub trait ScanProgress: Send + Sync {
    /// Called when a ticker evaluation starts.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a ticker evaluation finishes (including failures).
    fn on_complete(&self, symbol: &str, index: usize, total: usize, outcome: &TickerOutcome);

    /// Called once after the last ticker, or after cancellation.
    fn on_scan_complete(&self, summary: &ScanSummary);
}

/// Prints one line per finished ticker to stderr.
pub struct StderrProgress;

impl ScanProgress for StderrProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}

    fn on_complete(&self, symbol: &str, index: usize, total: usize, outcome: &TickerOutcome) {
        match outcome {
            TickerOutcome::Crossed => eprintln!("[{}/{total}] {symbol}: CROSSED UP", index + 1),
            TickerOutcome::NoCross => eprintln!("[{}/{total}] {symbol}: -", index + 1),
            TickerOutcome::Failed(failure) => {
                eprintln!("[{}/{total}] {symbol}: skipped ({failure})", index + 1)
            }
            TickerOutcome::Skipped => {}
        }
    }

    fn on_scan_complete(&self, summary: &ScanSummary) {
        eprintln!(
            "\nScan complete: {}/{} evaluated, {} crossed, {} failed",
            summary.evaluated(),
            summary.total,
            summary.crossed,
            summary.failed()
        );
    }
}
