//! Domain types: daily bars and per-symbol bar series.

pub mod bar;
pub mod series;

pub use bar::Bar;
pub use series::{BarError, BarSeries};
