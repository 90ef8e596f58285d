//! External collaborators: bar history providers and ticker universes.

pub mod circuit_breaker;
pub mod constituents;
pub mod csv_dir;
pub mod lookback;
pub mod memory;
pub mod provider;
pub mod universe;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use constituents::{parse_constituents, ConstituentsCsv, SP500_CONSTITUENTS_URL};
pub use csv_dir::CsvDirProvider;
pub use lookback::{Lookback, LookbackError, LookbackUnit};
pub use memory::InMemoryProvider;
pub use provider::{DataError, DataProvider, FetchFailureKind};
pub use universe::{dedupe_symbols, StaticUniverse, Universe, UniverseError, UniverseProvider};
pub use yahoo::YahooProvider;
