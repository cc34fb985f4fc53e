use serde::{Deserialize, Serialize};

use super::PlaceQuery;
use crate::cache::MemoCache;
use crate::models::{PoiCategory, PointOfInterest};

/// Memo table of successful place queries
pub type PlaceCache = MemoCache<PlaceQueryKey, Vec<PointOfInterest>>;

/// Cache key for radius queries
#[derive(Debug, Clone, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub struct PlaceQueryKey {
    pub category: PoiCategory,
    pub center_lat: i64, // Lat * 1000000 for precision
    pub center_lng: i64, // Lng * 1000000 for precision
    pub radius_m: u32,
}

impl PlaceQueryKey {
    #[must_use]
    pub fn new(query: &PlaceQuery) -> Self {
        // Coordinates have limited range, so the micro-degree values fit an i64
        let lat_micro = (query.lat * 1_000_000.0).round();
        let lng_micro = (query.lng * 1_000_000.0).round();

        Self {
            category: query.category,
            center_lat: lat_micro as i64,
            center_lng: lng_micro as i64,
            radius_m: query.radius_m,
        }
    }
}
