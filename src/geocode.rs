//! Address lookup for recentering the explore map

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::config::MapsConfig;
use crate::models::Location;
use crate::{GuideError, Result};

/// Shown when recentering is requested without a maps key
pub const GEOCODING_DISABLED: &str =
    "Address search needs a maps API key; the map stays where it is.";

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for `address`, `None` if nothing matched
    async fn geocode(&self, address: &str) -> Result<Option<Location>>;
}

/// Google Geocoding API client
pub struct GoogleGeocoder {
    client: Client,
    url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(config: &MapsConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("cityguide/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GuideError::config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: config.geocoding_url.clone(),
            api_key: api_key.into(),
        })
    }

    /// Client only when a key is configured
    pub fn from_config(config: &MapsConfig) -> Result<Option<Self>> {
        config
            .api_key
            .as_ref()
            .map(|key| Self::new(config, key.clone()))
            .transpose()
    }

    fn request_url(&self, address: &str) -> String {
        format!(
            "{}?address={}&key={}",
            self.url,
            urlencoding::encode(address),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Option<Location>> {
        let response = self
            .client
            .get(self.request_url(address))
            .send()
            .await
            .map_err(|e| GuideError::network(format!("Geocoding request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GuideError::api(format!(
                "Geocoding answered {}",
                response.status()
            )));
        }

        let body: google::GeocodeResponse = response
            .json()
            .await
            .map_err(|e| GuideError::parse(format!("Failed to parse geocoding response: {e}")))?;
        body.best_match()
    }
}

/// Google Geocoding wire types
pub mod google {
    use super::{GuideError, Location, Result, debug, info};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodeResponse {
        pub status: String,
        #[serde(default)]
        pub results: Vec<GeocodeResult>,
        pub error_message: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodeResult {
        pub formatted_address: String,
        pub geometry: Geometry,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        pub location: LatLng,
    }

    #[derive(Debug, Deserialize)]
    pub struct LatLng {
        pub lat: f64,
        pub lng: f64,
    }

    impl GeocodeResponse {
        pub fn best_match(self) -> Result<Option<Location>> {
            match self.status.as_str() {
                "OK" => {
                    let location = self.results.into_iter().next().map(|result| {
                        Location::new(
                            result.geometry.location.lat,
                            result.geometry.location.lng,
                            result.formatted_address,
                        )
                    });
                    if let Some(location) = &location {
                        info!("Geocoded to {} ({})", location.name, location.format_coordinates());
                    }
                    Ok(location)
                }
                "ZERO_RESULTS" => {
                    debug!("No geocoding match");
                    Ok(None)
                }
                status => Err(GuideError::api(format!(
                    "Geocoding failed with {status}: {}",
                    self.error_message.unwrap_or_default()
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_key_no_client() {
        assert!(GoogleGeocoder::from_config(&MapsConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_request_url() {
        let geocoder = GoogleGeocoder::new(&MapsConfig::default(), "secret").unwrap();
        assert_eq!(
            geocoder.request_url("Alexanderplatz 1, Berlin"),
            "https://maps.googleapis.com/maps/api/geocode/json?address=Alexanderplatz%201%2C%20Berlin&key=secret"
        );
    }

    #[test]
    fn test_best_match() {
        let body = r#"{
            "status": "OK",
            "results": [
                {"formatted_address": "Alexanderplatz, 10178 Berlin, Germany",
                 "geometry": {"location": {"lat": 52.5219, "lng": 13.4132}}},
                {"formatted_address": "Elsewhere",
                 "geometry": {"location": {"lat": 1.0, "lng": 2.0}}}
            ]
        }"#;
        let response: google::GeocodeResponse = serde_json::from_str(body).unwrap();
        let location = response.best_match().unwrap().unwrap();
        assert_eq!(location.lat_lng(), [52.5219, 13.4132]);
        assert!(location.name.starts_with("Alexanderplatz"));
    }

    #[test]
    fn test_status_handling() {
        let none: google::GeocodeResponse =
            serde_json::from_str(r#"{"status": "ZERO_RESULTS", "results": []}"#).unwrap();
        assert!(none.best_match().unwrap().is_none());

        let denied: google::GeocodeResponse = serde_json::from_str(
            r#"{"status": "REQUEST_DENIED", "error_message": "bad key"}"#,
        )
        .unwrap();
        assert!(matches!(denied.best_match(), Err(GuideError::Api { .. })));
    }
}
