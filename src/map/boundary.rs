//! District boundary polygons
//!
//! The choropleth joins crime totals to GeoJSON features by their `name`
//! property. Boundaries are fetched once per URL and reused.

use async_trait::async_trait;
use geojson::{FeatureCollection, GeoJson};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::cache::MemoCache;
use crate::{GuideError, Result};

/// Provider of boundary feature collections
#[async_trait]
pub trait BoundarySource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FeatureCollection>;
}

/// Parse a GeoJSON document that must be a feature collection
pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| GuideError::parse(format!("Invalid boundary GeoJSON: {e}")))?;
    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        _ => Err(GuideError::parse(
            "Boundary GeoJSON is not a FeatureCollection",
        )),
    }
}

pub struct HttpBoundarySource {
    client: Client,
}

impl HttpBoundarySource {
    pub fn new(timeout_seconds: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.into()))
            .user_agent(concat!("cityguide/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GuideError::config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BoundarySource for HttpBoundarySource {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<FeatureCollection> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GuideError::network(format!("Boundary download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GuideError::api(format!(
                "Boundary download answered {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        let collection = parse_feature_collection(&text)?;
        info!("Loaded {} boundary features", collection.features.len());
        Ok(collection)
    }
}

/// Memoizing wrapper; only successful downloads are kept
pub struct BoundaryLoader {
    source: Arc<dyn BoundarySource>,
    cache: MemoCache<String, Arc<FeatureCollection>>,
}

impl BoundaryLoader {
    pub fn new(source: Arc<dyn BoundarySource>) -> Self {
        Self {
            source,
            cache: MemoCache::new(),
        }
    }

    pub async fn try_load(&self, url: &str) -> Result<Arc<FeatureCollection>> {
        let key = url.to_string();
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }
        let collection = Arc::new(self.source.fetch(url).await?);
        self.cache.put(key, collection.clone());
        Ok(collection)
    }

    /// `None` when the boundaries cannot be obtained
    pub async fn load(&self, url: &str) -> Option<Arc<FeatureCollection>> {
        match self.try_load(url).await {
            Ok(collection) => Some(collection),
            Err(e) => {
                warn!("District boundaries unavailable: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) const TWO_DISTRICTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "Mitte"},
             "geometry": {"type": "Polygon", "coordinates": [[[13.36,52.50],[13.42,52.50],[13.42,52.54],[13.36,52.50]]]}},
            {"type": "Feature", "properties": {"name": "Pankow"},
             "geometry": {"type": "Polygon", "coordinates": [[[13.38,52.55],[13.45,52.55],[13.45,52.62],[13.38,52.55]]]}}
        ]
    }"#;

    /// Serves a fixed document, or fails when it is `None`
    pub(crate) struct FakeBoundaries {
        pub document: Option<&'static str>,
        pub calls: AtomicUsize,
    }

    impl FakeBoundaries {
        pub(crate) fn with(document: Option<&'static str>) -> Self {
            Self {
                document,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BoundarySource for FakeBoundaries {
        async fn fetch(&self, _url: &str) -> Result<FeatureCollection> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.document {
                Some(text) => parse_feature_collection(text),
                None => Err(GuideError::network("offline")),
            }
        }
    }

    #[test]
    fn test_parse_feature_collection() {
        let collection = parse_feature_collection(TWO_DISTRICTS).unwrap();
        assert_eq!(collection.features.len(), 2);
        assert_eq!(
            collection.features[0]
                .property("name")
                .and_then(|v| v.as_str()),
            Some("Mitte")
        );
    }

    #[test]
    fn test_parse_rejects_other_documents() {
        let point = r#"{"type": "Point", "coordinates": [13.4, 52.5]}"#;
        assert!(matches!(
            parse_feature_collection(point),
            Err(GuideError::Parse { .. })
        ));
        assert!(parse_feature_collection("not json").is_err());
    }

    #[tokio::test]
    async fn test_loader_memoizes_success_only() {
        let failing = Arc::new(FakeBoundaries::with(None));
        let loader = BoundaryLoader::new(failing.clone());
        assert!(loader.load("https://example.test/a").await.is_none());
        assert!(loader.load("https://example.test/a").await.is_none());
        assert_eq!(failing.calls.load(Ordering::SeqCst), 2);

        let working = Arc::new(FakeBoundaries::with(Some(TWO_DISTRICTS)));
        let loader = BoundaryLoader::new(working.clone());
        let first = loader.load("https://example.test/a").await.unwrap();
        let second = loader.load("https://example.test/a").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(working.calls.load(Ordering::SeqCst), 1);
    }
}
