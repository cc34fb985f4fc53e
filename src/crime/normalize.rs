//! Region name normalization
//!
//! District totals are joined to boundary polygons by name. The exact
//! matching rule depends on the data sets in use, so it is a strategy.

/// Maps a region name to the form used for joining
pub trait NameNormalizer: Send + Sync {
    fn normalize(&self, name: &str) -> String;
}

/// Trims surrounding whitespace; the default
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimWhitespace;

/// Leaves names untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

/// Trims and lowercases
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFold;

impl NameNormalizer for TrimWhitespace {
    fn normalize(&self, name: &str) -> String {
        name.trim().to_string()
    }
}

impl NameNormalizer for Exact {
    fn normalize(&self, name: &str) -> String {
        name.to_string()
    }
}

impl NameNormalizer for CaseFold {
    fn normalize(&self, name: &str) -> String {
        name.trim().to_lowercase()
    }
}
