//! Crime overlay data
//!
//! Loads a district crime table, keeps the latest year and sums the
//! incident columns per district for the choropleth layer.

pub mod loader;
pub mod normalize;

pub use loader::{CrimeLoader, EXCLUDED_COLUMNS, aggregate};
pub use normalize::{CaseFold, Exact, NameNormalizer, TrimWhitespace};
