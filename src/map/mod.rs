//! Map composition
//!
//! Turns crime totals, boundary polygons, place lists and itinerary stops
//! into one serializable [`MapView`], and renders that view as a Leaflet page.

pub mod boundary;
pub mod html;
pub mod render;
pub mod style;

use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{
    ItineraryStop, Location, PoiCategory, PointOfInterest, RegionCrimeAggregate, StopKind,
};
use style::CircleStyle;

pub use boundary::{BoundaryLoader, BoundarySource, HttpBoundarySource};
pub use html::render_html;
pub use render::MapRenderer;

/// Everything a map needs, gathered by the caller
#[derive(Debug, Clone)]
pub struct MapRequest {
    pub center: Location,
    pub zoom: u8,
    pub crime: Option<Vec<RegionCrimeAggregate>>,
    pub boundaries: Option<Arc<FeatureCollection>>,
    pub places: Vec<(PoiCategory, Vec<PointOfInterest>)>,
    pub itinerary: Option<Vec<ItineraryStop>>,
}

impl MapRequest {
    #[must_use]
    pub fn new(center: Location, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            crime: None,
            boundaries: None,
            places: Vec::new(),
            itinerary: None,
        }
    }

    #[must_use]
    pub fn with_crime(
        mut self,
        crime: Vec<RegionCrimeAggregate>,
        boundaries: Option<Arc<FeatureCollection>>,
    ) -> Self {
        self.crime = Some(crime);
        self.boundaries = boundaries;
        self
    }

    #[must_use]
    pub fn with_places(mut self, category: PoiCategory, places: Vec<PointOfInterest>) -> Self {
        self.places.push((category, places));
        self
    }

    #[must_use]
    pub fn with_itinerary(mut self, stops: Vec<ItineraryStop>) -> Self {
        self.itinerary = Some(stops);
        self
    }
}

/// A composed, layered map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapView {
    /// `[lat, lng]`
    pub center: [f64; 2],
    pub zoom: u8,
    pub choropleth: Option<ChoroplethLayer>,
    pub marker_layers: Vec<MarkerLayer>,
    pub route: Option<RouteLayer>,
    /// Non-fatal problems worth a banner
    pub warnings: Vec<String>,
}

impl MapView {
    #[must_use]
    pub fn layer(&self, category: PoiCategory) -> Option<&MarkerLayer> {
        self.marker_layers.iter().find(|l| l.category == category)
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.marker_layers.iter().map(|l| l.markers.len()).sum()
    }
}

/// Regions shaded by incident totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoroplethLayer {
    pub name: String,
    /// Boundary features with `fill_color` and `total_incidents` properties
    pub features: FeatureCollection,
    pub legend: Vec<LegendBin>,
    pub fill_opacity: f64,
    pub line_opacity: f64,
    /// Count of boundary features that received a value
    pub matched_regions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendBin {
    pub lower: f64,
    pub upper: f64,
    pub color: String,
}

/// One category of places
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerLayer {
    pub name: String,
    pub category: PoiCategory,
    pub style: CircleStyle,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    /// Shown on interaction
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Numbered stops joined by a straight polyline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLayer {
    pub stops: Vec<StopMarker>,
    /// `[lat, lng]` in catalog order
    pub path: Vec<[f64; 2]>,
    pub color: String,
    pub weight: u8,
    pub opacity: f64,
    /// Straight-line length of the polyline
    pub length_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopMarker {
    pub ordinal: u8,
    pub lat: f64,
    pub lng: f64,
    pub label: String,
    pub kind: StopKind,
    pub color: String,
    pub icon: String,
}
