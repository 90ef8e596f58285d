//! Crossover signals: price vs indicator on the two most recent bars.
//!
//! Signals depend only on closes and precomputed indicator values. They never
//! fail: missing data and "no cross" both mean there is nothing to confirm.

pub mod crossover;

pub use crossover::{crossed_down, crossed_up, detect, Crossover};
