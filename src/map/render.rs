use geojson::FeatureCollection;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use super::style::{
    self, CHOROPLETH_FILL_OPACITY, CHOROPLETH_LINE_OPACITY, ColorScale, NO_DATA_COLOR,
    ROUTE_COLOR, ROUTE_OPACITY, ROUTE_WEIGHT,
};
use super::{
    ChoroplethLayer, LegendBin, MapRequest, MapView, Marker, MarkerLayer, RouteLayer, StopMarker,
};
use crate::crime::{NameNormalizer, TrimWhitespace};
use crate::models::{ItineraryStop, PoiCategory, PointOfInterest, RegionCrimeAggregate};

/// Boundary property holding the region name
pub const REGION_NAME_PROPERTY: &str = "name";

/// Composes map layers; performs no I/O
pub struct MapRenderer {
    normalizer: Arc<dyn NameNormalizer>,
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new(Arc::new(TrimWhitespace))
    }
}

impl MapRenderer {
    /// `normalizer` must match the one the crime loader uses
    pub fn new(normalizer: Arc<dyn NameNormalizer>) -> Self {
        Self { normalizer }
    }

    pub fn render(&self, request: &MapRequest) -> MapView {
        let mut warnings = Vec::new();

        let choropleth = match (&request.crime, &request.boundaries) {
            (Some(crime), _) if crime.is_empty() => None,
            (Some(crime), Some(boundaries)) => {
                self.choropleth(crime, boundaries, &mut warnings)
            }
            (Some(_), None) => {
                warnings.push("District boundaries are unavailable, crime layer hidden".into());
                None
            }
            (None, _) => None,
        };

        let marker_layers = request
            .places
            .iter()
            .map(|(category, places)| marker_layer(*category, places))
            .collect();

        let route = request.itinerary.as_deref().and_then(route_layer);

        MapView {
            center: request.center.lat_lng(),
            zoom: request.zoom,
            choropleth,
            marker_layers,
            route,
            warnings,
        }
    }

    fn choropleth(
        &self,
        crime: &[RegionCrimeAggregate],
        boundaries: &FeatureCollection,
        warnings: &mut Vec<String>,
    ) -> Option<ChoroplethLayer> {
        let scale = ColorScale::spanning(crime.iter().map(|a| a.total_incidents))?;

        let totals: HashMap<String, &RegionCrimeAggregate> = crime
            .iter()
            .map(|a| (self.normalizer.normalize(&a.region_name), a))
            .collect();

        let mut features = boundaries.clone();
        let mut matched: HashSet<String> = HashSet::new();
        for feature in &mut features.features {
            let key = feature
                .property(REGION_NAME_PROPERTY)
                .and_then(|v| v.as_str())
                .map(|name| self.normalizer.normalize(name));

            match key.as_ref().and_then(|k| totals.get(k)) {
                Some(aggregate) => {
                    feature.set_property("total_incidents", aggregate.total_incidents);
                    feature.set_property("fill_color", scale.color(aggregate.total_incidents));
                    if let Some(key) = key {
                        matched.insert(key);
                    }
                }
                None => {
                    feature.set_property("total_incidents", serde_json::Value::Null);
                    feature.set_property("fill_color", NO_DATA_COLOR);
                }
            }
        }

        let mut unmatched: Vec<&str> = crime
            .iter()
            .filter(|a| !matched.contains(&self.normalizer.normalize(&a.region_name)))
            .map(|a| a.region_name.as_str())
            .collect();
        unmatched.sort_unstable();
        if !unmatched.is_empty() {
            warn!("Crime regions without a boundary: {:?}", unmatched);
            warnings.push(format!(
                "No boundary found for: {}",
                unmatched.join(", ")
            ));
        }
        debug!(
            "Shaded {} of {} boundary regions",
            matched.len(),
            features.features.len()
        );

        let legend = scale
            .bins()
            .into_iter()
            .map(|(lower, upper, color)| LegendBin {
                lower,
                upper,
                color: color.to_string(),
            })
            .collect();

        Some(ChoroplethLayer {
            name: "Crime Rate".to_string(),
            features,
            legend,
            fill_opacity: CHOROPLETH_FILL_OPACITY,
            line_opacity: CHOROPLETH_LINE_OPACITY,
            matched_regions: matched.len(),
        })
    }
}

fn marker_layer(category: PoiCategory, places: &[PointOfInterest]) -> MarkerLayer {
    let markers = places
        .iter()
        .map(|place| Marker {
            lat: place.lat,
            lng: place.lng,
            label: place.name.clone(),
            detail: match category {
                PoiCategory::Restaurant => place.cuisine.clone(),
                _ => None,
            },
        })
        .collect();

    MarkerLayer {
        name: category.layer_name().to_string(),
        category,
        style: style::category_style(category),
        markers,
    }
}

fn route_layer(stops: &[ItineraryStop]) -> Option<RouteLayer> {
    if stops.is_empty() {
        return None;
    }

    let markers = stops
        .iter()
        .map(|stop| {
            let (color, icon) = style::stop_style(stop.kind);
            StopMarker {
                ordinal: stop.ordinal,
                lat: stop.lat,
                lng: stop.lng,
                label: stop.numbered_name(),
                kind: stop.kind,
                color: color.to_string(),
                icon: icon.to_string(),
            }
        })
        .collect();

    let length_km = stops
        .windows(2)
        .map(|pair| pair[0].location().distance_km(&pair[1].location()))
        .sum();

    Some(RouteLayer {
        stops: markers,
        path: stops.iter().map(|s| [s.lat, s.lng]).collect(),
        color: ROUTE_COLOR.to_string(),
        weight: ROUTE_WEIGHT,
        opacity: ROUTE_OPACITY,
        length_km,
    })
}
