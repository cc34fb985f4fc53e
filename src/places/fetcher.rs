use std::sync::Arc;
use tracing::{debug, info, warn};

use super::overpass::normalize_elements;
use super::{PlaceCache, PlaceQuery, PlaceSource};
use crate::Result;
use crate::models::{PoiCategory, PointOfInterest};

/// Memoizing point-of-interest fetcher
pub struct PoiFetcher {
    source: Arc<dyn PlaceSource>,
    cache: PlaceCache,
}

impl PoiFetcher {
    pub fn new(source: Arc<dyn PlaceSource>) -> Self {
        Self {
            source,
            cache: PlaceCache::new(),
        }
    }

    /// Fetch places, distinguishing failure from an empty result.
    ///
    /// Successful results are memoized per exact query; failures are not.
    pub async fn try_fetch(&self, query: &PlaceQuery) -> Result<Vec<PointOfInterest>> {
        let key = query.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            debug!("Serving {} {} places from cache", cached.len(), query.category);
            return Ok(cached);
        }

        let elements = self.source.elements(query).await?;
        let places = normalize_elements(query.category, &elements);
        info!(
            "Kept {} named {} places out of {} elements",
            places.len(),
            query.category,
            elements.len()
        );

        self.cache.put(key, places.clone());
        Ok(places)
    }

    /// Fetch places; any failure degrades to an empty list so the map
    /// always renders.
    pub async fn fetch(
        &self,
        category: PoiCategory,
        center_lat: f64,
        center_lng: f64,
        radius_m: u32,
    ) -> Vec<PointOfInterest> {
        let query = PlaceQuery::new(category, center_lat, center_lng, radius_m);
        match self.try_fetch(&query).await {
            Ok(places) => places,
            Err(e) => {
                warn!("Place lookup for {} failed, showing none: {}", category, e);
                Vec::new()
            }
        }
    }

    /// Like [`fetch`](Self::fetch) but takes the category by name.
    /// Unsupported names yield an empty list without any network call.
    pub async fn fetch_named(
        &self,
        category: &str,
        center_lat: f64,
        center_lng: f64,
        radius_m: u32,
    ) -> Vec<PointOfInterest> {
        match PoiCategory::parse(category) {
            Some(category) => self.fetch(category, center_lat, center_lng, radius_m).await,
            None => {
                debug!("Unsupported place category '{}'", category);
                Vec::new()
            }
        }
    }

    #[must_use]
    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::GuideError;
    use crate::places::OverpassElement;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned source that counts how often it is asked
    pub(crate) struct FakeSource {
        pub elements: Mutex<Vec<OverpassElement>>,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl FakeSource {
        pub(crate) fn with(elements: Vec<OverpassElement>) -> Self {
            Self {
                elements: Mutex::new(elements),
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                elements: Mutex::new(Vec::new()),
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlaceSource for FakeSource {
        async fn elements(&self, _query: &PlaceQuery) -> Result<Vec<OverpassElement>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GuideError::network("connection refused"));
            }
            Ok(self.elements.lock().unwrap().clone())
        }
    }

    pub(crate) fn named(name: &str, lat: f64, lon: f64) -> OverpassElement {
        OverpassElement {
            lat: Some(lat),
            lon: Some(lon),
            center: None,
            tags: Some(HashMap::from([("name".to_string(), name.to_string())])),
        }
    }

    fn unnamed(lat: f64, lon: f64) -> OverpassElement {
        OverpassElement {
            lat: Some(lat),
            lon: Some(lon),
            center: None,
            tags: Some(HashMap::from([("tourism".to_string(), "hotel".to_string())])),
        }
    }

    fn untagged() -> OverpassElement {
        OverpassElement {
            lat: Some(52.0),
            lon: Some(13.0),
            ..OverpassElement::default()
        }
    }

    #[tokio::test]
    async fn test_keeps_named_subset_in_source_order() {
        let source = Arc::new(FakeSource::with(vec![
            named("Zoo Palast Hotel", 52.50, 13.33),
            unnamed(52.51, 13.34),
            untagged(),
            named("Adlon", 52.51, 13.38),
            named("Adlon", 52.51, 13.38),
        ]));
        let fetcher = PoiFetcher::new(source.clone());

        let places = fetcher.fetch(PoiCategory::Hotel, 52.52, 13.405, 4000).await;

        let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Zoo Palast Hotel", "Adlon", "Adlon"]);
        assert!(places.iter().all(|p| p.category == PoiCategory::Hotel));
    }

    #[tokio::test]
    async fn test_unsupported_category_makes_no_call() {
        let source = Arc::new(FakeSource::with(vec![named("Anything", 1.0, 2.0)]));
        let fetcher = PoiFetcher::new(source.clone());

        let places = fetcher.fetch_named("nightclub", 52.52, 13.405, 3000).await;

        assert!(places.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_named_category_dispatch() {
        let source = Arc::new(FakeSource::with(vec![named("Pergamon", 52.52, 13.40)]));
        let fetcher = PoiFetcher::new(source.clone());

        let places = fetcher.fetch_named("tourism", 52.52, 13.405, 3000).await;

        assert_eq!(places.len(), 1);
        assert_eq!(places[0].category, PoiCategory::Attraction);
    }

    #[tokio::test]
    async fn test_repeated_fetch_is_memoized() {
        let source = Arc::new(FakeSource::with(vec![named("Burgermeister", 52.50, 13.44)]));
        let fetcher = PoiFetcher::new(source.clone());

        let first = fetcher.fetch(PoiCategory::Restaurant, 52.52, 13.405, 3000).await;
        let second = fetcher.fetch(PoiCategory::Restaurant, 52.52, 13.405, 3000).await;
        let other_radius = fetcher.fetch(PoiCategory::Restaurant, 52.52, 13.405, 2000).await;

        assert_eq!(first, second);
        assert_eq!(other_radius, first);
        assert_eq!(source.calls(), 2);
        assert_eq!(fetcher.cached_queries(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed_and_not_memoized() {
        let source = Arc::new(FakeSource::failing());
        let fetcher = PoiFetcher::new(source.clone());

        let places = fetcher.fetch(PoiCategory::Restaurant, 52.52, 13.405, 3000).await;
        assert!(places.is_empty());

        let query = PlaceQuery::new(PoiCategory::Restaurant, 52.52, 13.405, 3000);
        let err = fetcher.try_fetch(&query).await.unwrap_err();
        assert!(matches!(err, GuideError::Network { .. }));
        assert_eq!(source.calls(), 2);
        assert_eq!(fetcher.cached_queries(), 0);
    }
}
