//! Screener Runner: scan orchestration over a ticker universe.
//!
//! This crate builds on `screener-core` to provide:
//! - TOML scan configuration with CLI-overridable defaults
//! - The concurrent, failure-isolating scan pipeline
//! - Progress hooks for interactive front ends

pub mod config;
pub mod progress;
pub mod scan;

pub use config::{ConfigError, IndicatorSection, ScanConfig, ScanSection, UniverseSection};
pub use progress::{ScanProgress, StderrProgress};
pub use scan::{
    evaluate_series, run_scan, scan, scan_with, ScanError, ScanOptions, ScanReport, ScanSummary,
    TickerFailure, TickerOutcome, TickerResult,
};
