//! Places module
//!
//! Point-of-interest lookup against the Overpass (OpenStreetMap) API:
//! - Query construction and response parsing (`overpass`)
//! - Per-query memoization for the process lifetime (`cache`)
//! - The fail-soft fetcher used by the views (`fetcher`)

pub mod cache;
pub mod fetcher;
pub mod overpass;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::models::PoiCategory;

pub use cache::{PlaceCache, PlaceQueryKey};
pub use fetcher::PoiFetcher;
pub use overpass::{OverpassClient, OverpassElement, OverpassResponse};

/// Radius query for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceQuery {
    pub category: PoiCategory,
    pub lat: f64,
    pub lng: f64,
    pub radius_m: u32,
}

impl PlaceQuery {
    #[must_use]
    pub fn new(category: PoiCategory, lat: f64, lng: f64, radius_m: u32) -> Self {
        Self {
            category,
            lat,
            lng,
            radius_m,
        }
    }

    #[must_use]
    pub fn cache_key(&self) -> PlaceQueryKey {
        PlaceQueryKey::new(self)
    }
}

/// Raw element provider behind the fetcher
#[async_trait]
pub trait PlaceSource: Send + Sync {
    /// Run one radius query and return the elements in source order
    async fn elements(&self, query: &PlaceQuery) -> Result<Vec<OverpassElement>>;
}
