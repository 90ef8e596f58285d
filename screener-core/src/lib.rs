//! Screener Core: Supertrend indicator, crossover detection and data sources.
//!
//! This crate contains everything a single-ticker evaluation needs:
//! - Domain types (daily bars, ordered bar series)
//! - True range, Wilder ATR and the Supertrend fold
//! - Crossing-up / crossing-down detection on the two latest bars
//! - Bar history providers (Yahoo Finance, CSV directory, in-memory)
//! - Ticker universe providers (constituents CSV, sector TOML, static list)
//!
//! Batch orchestration lives in `screener-runner`.

pub mod data;
pub mod domain;
pub mod indicators;
pub mod signals;
