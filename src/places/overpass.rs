use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::{PlaceQuery, PlaceSource};
use crate::config::OverpassConfig;
use crate::models::{DEFAULT_CUISINE, PoiCategory, PointOfInterest};
use crate::{GuideError, Result};

/// Overpass interpreter client
pub struct OverpassClient {
    client: Client,
    base_url: String,
}

/// Top-level `[out:json]` document
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// One node/way/relation from the response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverpassElement {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Present on ways and relations queried with `out center`
    pub center: Option<OverpassCenter>,
    pub tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OverpassCenter {
    pub lat: f64,
    pub lon: f64,
}

impl OverpassElement {
    fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => self.center.map(|center| (center.lat, center.lon)),
        }
    }

    /// Convert to a point of interest; `None` if unnamed or unplaceable
    #[must_use]
    pub fn to_point_of_interest(&self, category: PoiCategory) -> Option<PointOfInterest> {
        let tags = self.tags.as_ref()?;
        let name = tags.get("name")?;

        let Some((lat, lng)) = self.coordinates() else {
            debug!("Skipping '{}': element carries no coordinates", name);
            return None;
        };

        let cuisine = match category {
            PoiCategory::Restaurant => Some(
                tags.get("cuisine")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_CUISINE.to_string()),
            ),
            PoiCategory::Hotel | PoiCategory::Attraction => None,
        };

        Some(PointOfInterest {
            name: name.clone(),
            lat,
            lng,
            category,
            cuisine,
        })
    }
}

/// Build the Overpass QL text for a radius query
#[must_use]
pub fn build_query(query: &PlaceQuery) -> String {
    format!(
        "[out:json];(node{}(around:{},{},{}););out body;",
        query.category.overpass_filter(),
        query.radius_m,
        query.lat,
        query.lng
    )
}

/// Keep named elements in source order
#[must_use]
pub fn normalize_elements(
    category: PoiCategory,
    elements: &[OverpassElement],
) -> Vec<PointOfInterest> {
    elements
        .iter()
        .filter_map(|element| element.to_point_of_interest(category))
        .collect()
}

impl OverpassClient {
    /// Create a new client
    pub fn new(config: &OverpassConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("cityguide/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GuideError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn request_url(&self, query: &PlaceQuery) -> String {
        format!(
            "{}?data={}",
            self.base_url,
            urlencoding::encode(&build_query(query))
        )
    }
}

#[async_trait]
impl PlaceSource for OverpassClient {
    #[instrument(skip(self), fields(category = %query.category))]
    async fn elements(&self, query: &PlaceQuery) -> Result<Vec<OverpassElement>> {
        info!(
            "Querying Overpass for {} within {}m of ({}, {})",
            query.category, query.radius_m, query.lat, query.lng
        );
        let start_time = Instant::now();

        let response = self
            .client
            .get(self.request_url(query))
            .send()
            .await
            .map_err(|e| GuideError::network(format!("Overpass request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Overpass answered {}: {}", status, error_text);
            return Err(GuideError::api(format!(
                "Overpass API error {status}: {error_text}"
            )));
        }

        let body: OverpassResponse = response
            .json()
            .await
            .map_err(|e| GuideError::parse(format!("Failed to parse Overpass response: {e}")))?;

        info!(
            "Overpass returned {} elements in {:.3}s",
            body.elements.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(body.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(json: &str) -> OverpassElement {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_build_query() {
        let query = PlaceQuery::new(PoiCategory::Hotel, 52.52, 13.405, 4000);
        assert_eq!(
            build_query(&query),
            r#"[out:json];(node["tourism"="hotel"](around:4000,52.52,13.405););out body;"#
        );
    }

    #[test]
    fn test_request_url_encodes_query() {
        let client = OverpassClient::new(&OverpassConfig::default()).unwrap();
        let query = PlaceQuery::new(PoiCategory::Restaurant, 52.52, 13.405, 3000);
        let url = client.request_url(&query);
        assert!(url.starts_with("https://overpass-api.de/api/interpreter?data="));
        assert!(url.contains("%5Bout%3Ajson%5D"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_parse_response_document() {
        let body = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 52.5, "lon": 13.4,
                 "tags": {"name": "Monsieur Vuong", "cuisine": "vietnamese", "amenity": "restaurant"}},
                {"type": "node", "id": 2, "lat": 52.51, "lon": 13.41,
                 "tags": {"amenity": "restaurant"}},
                {"type": "node", "id": 3, "lat": 52.52, "lon": 13.42}
            ]
        }"#;
        let response: OverpassResponse = serde_json::from_str(body).unwrap();
        let places = normalize_elements(PoiCategory::Restaurant, &response.elements);

        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Monsieur Vuong");
        assert_eq!(places[0].cuisine.as_deref(), Some("vietnamese"));
        assert_eq!(places[0].lat, 52.5);
        assert_eq!(places[0].lng, 13.4);
    }

    #[test]
    fn test_missing_cuisine_gets_placeholder() {
        let el = element(r#"{"lat": 1.0, "lon": 2.0, "tags": {"name": "Imbiss"}}"#);
        let poi = el.to_point_of_interest(PoiCategory::Restaurant).unwrap();
        assert_eq!(poi.cuisine.as_deref(), Some(DEFAULT_CUISINE));
    }

    #[test]
    fn test_cuisine_only_for_restaurants() {
        let el = element(r#"{"lat": 1.0, "lon": 2.0, "tags": {"name": "Adlon", "cuisine": "german"}}"#);
        let poi = el.to_point_of_interest(PoiCategory::Hotel).unwrap();
        assert!(poi.cuisine.is_none());
    }

    #[test]
    fn test_center_fallback_and_unplaceable() {
        let way = element(r#"{"center": {"lat": 3.0, "lon": 4.0}, "tags": {"name": "Museum"}}"#);
        let poi = way.to_point_of_interest(PoiCategory::Attraction).unwrap();
        assert_eq!((poi.lat, poi.lng), (3.0, 4.0));

        let nowhere = element(r#"{"tags": {"name": "Ghost"}}"#);
        assert!(nowhere.to_point_of_interest(PoiCategory::Attraction).is_none());
    }

    #[test]
    fn test_empty_document() {
        let response: OverpassResponse = serde_json::from_str("{}").unwrap();
        assert!(response.elements.is_empty());
    }
}
