//! Point-of-interest model

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::GuideError;

/// Placeholder cuisine for restaurants without a `cuisine` tag
pub const DEFAULT_CUISINE: &str = "General";

/// The closed set of place categories the guide can query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiCategory {
    Restaurant,
    Hotel,
    Attraction,
}

impl PoiCategory {
    pub const ALL: [PoiCategory; 3] = [
        PoiCategory::Restaurant,
        PoiCategory::Hotel,
        PoiCategory::Attraction,
    ];

    /// Parse a category name; `None` for anything outside the closed set
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "restaurant" => Some(PoiCategory::Restaurant),
            "hotel" => Some(PoiCategory::Hotel),
            "attraction" | "tourism" => Some(PoiCategory::Attraction),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PoiCategory::Restaurant => "restaurant",
            PoiCategory::Hotel => "hotel",
            PoiCategory::Attraction => "attraction",
        }
    }

    /// Overpass tag filter selecting this category
    #[must_use]
    pub fn overpass_filter(&self) -> &'static str {
        match self {
            PoiCategory::Restaurant => r#"["amenity"="restaurant"]"#,
            PoiCategory::Hotel => r#"["tourism"="hotel"]"#,
            PoiCategory::Attraction => r#"["tourism"~"attraction|museum|artwork|viewpoint"]"#,
        }
    }

    /// Human readable layer name
    #[must_use]
    pub fn layer_name(&self) -> &'static str {
        match self {
            PoiCategory::Restaurant => "Restaurants",
            PoiCategory::Hotel => "Hotels",
            PoiCategory::Attraction => "Attractions",
        }
    }
}

impl Display for PoiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoiCategory {
    type Err = GuideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| GuideError::not_found(format!("place category '{s}'")))
    }
}

/// A named place returned by the map data service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub category: PoiCategory,
    /// Only set for restaurants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}
