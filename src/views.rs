//! View orchestration
//!
//! Gathers the data each dashboard view needs from the fetchers and loaders,
//! hands it to the renderer and packages the result. External failures are
//! turned into warnings here and never fail a view.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::chat::{ChatPanel, ChatTurn};
use crate::config::GuideConfig;
use crate::crime::{CrimeLoader, NameNormalizer, TrimWhitespace};
use crate::geocode::{GEOCODING_DISABLED, Geocoder, GoogleGeocoder};
use crate::guestbook::GuestbookEntry;
use crate::itinerary;
use crate::map::{
    BoundaryLoader, BoundarySource, HttpBoundarySource, MapRenderer, MapRequest, MapView,
};
use crate::models::{Location, PointOfInterest, StopKind};
use crate::places::{OverpassClient, PlaceSource, PoiFetcher};
use crate::session::{MapFilters, Session};
use crate::Result;

/// Zoom of the itinerary map
pub const ITINERARY_ZOOM: u8 = 13;
/// Zero-based stop the itinerary map centers on
pub const ITINERARY_CENTER_STOP: usize = 2;

pub const CRIME_UNAVAILABLE: &str = "Crime statistics are unavailable, crime layer hidden";

#[derive(Debug, Clone, Serialize)]
pub struct ExploreView {
    pub map: MapView,
    pub filters: MapFilters,
    /// Banner messages, in the order they arose
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopDetail {
    pub ordinal: u8,
    pub name: String,
    pub kind: StopKind,
    pub symbol: String,
    pub description: String,
    pub search_link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItineraryView {
    pub key: String,
    pub title: String,
    pub map: MapView,
    pub stops: Vec<StopDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelView {
    /// Every catalog stop name, sorted
    pub places: Vec<String>,
    pub selected_place: Option<String>,
    pub entries: Vec<GuestbookEntry>,
    pub transcript: Vec<ChatTurn>,
    pub assistant_available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecenterOutcome {
    pub moved: bool,
    pub center: Location,
    pub message: String,
}

/// Builds every view of the dashboard
pub struct ViewOrchestrator {
    config: GuideConfig,
    places: PoiFetcher,
    crime: CrimeLoader,
    boundaries: BoundaryLoader,
    renderer: MapRenderer,
    chat: ChatPanel,
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl ViewOrchestrator {
    pub fn new(
        config: GuideConfig,
        place_source: Arc<dyn PlaceSource>,
        boundary_source: Arc<dyn BoundarySource>,
        chat: ChatPanel,
        geocoder: Option<Arc<dyn Geocoder>>,
    ) -> Self {
        // Crime totals and boundary names must be joined with the same rule
        let normalizer: Arc<dyn NameNormalizer> = Arc::new(TrimWhitespace);
        Self {
            config,
            places: PoiFetcher::new(place_source),
            crime: CrimeLoader::new(normalizer.clone()),
            boundaries: BoundaryLoader::new(boundary_source),
            renderer: MapRenderer::new(normalizer),
            chat,
            geocoder,
        }
    }

    /// Wire up the real HTTP clients
    pub fn from_config(config: GuideConfig) -> Result<Self> {
        let place_source = Arc::new(OverpassClient::new(&config.overpass)?);
        let boundary_source = Arc::new(HttpBoundarySource::new(config.overpass.timeout_seconds)?);
        let chat = ChatPanel::from_config(&config.llm)?;
        let geocoder = GoogleGeocoder::from_config(&config.maps)?
            .map(|geocoder| Arc::new(geocoder) as Arc<dyn Geocoder>);
        info!(
            "Assistant {}, address search {}",
            if chat.has_provider() { "enabled" } else { "disabled" },
            if geocoder.is_some() { "enabled" } else { "disabled" }
        );
        Ok(Self::new(config, place_source, boundary_source, chat, geocoder))
    }

    #[must_use]
    pub fn config(&self) -> &GuideConfig {
        &self.config
    }

    #[must_use]
    pub fn chat(&self) -> &ChatPanel {
        &self.chat
    }

    /// Explore map for the session's filters
    pub async fn explore(&self, session: &Session) -> ExploreView {
        let filters = &session.filters;
        let center = &filters.center;
        let mut request = MapRequest::new(center.clone(), self.config.map.zoom);
        let mut warnings = Vec::new();

        if filters.crime {
            let aggregates = self.crime.load(&self.config.crime.csv_path);
            if aggregates.is_empty() {
                warnings.push(CRIME_UNAVAILABLE.to_string());
            } else {
                let boundaries = self.boundaries.load(&self.config.crime.boundary_url).await;
                request = request.with_crime(aggregates, boundaries);
            }
        }

        for category in filters.enabled_categories() {
            let places = self
                .places
                .fetch(category, center.latitude, center.longitude, filters.radius_m)
                .await;
            request = request.with_places(category, places);
        }

        let map = self.renderer.render(&request);
        warnings.extend(map.warnings.iter().cloned());
        info!(
            "Explore view for session {}: {} markers, {} warnings",
            session.id,
            map.marker_count(),
            warnings.len()
        );

        ExploreView {
            map,
            filters: filters.clone(),
            warnings,
        }
    }

    /// Route map and stop list of one theme
    pub fn itinerary(&self, session: &Session, key: &str) -> Result<ItineraryView> {
        let theme = itinerary::theme_by_key(key)?;
        let stops = theme.stops.clone();

        let center = stops
            .get(ITINERARY_CENTER_STOP)
            .or_else(|| stops.first())
            .map_or_else(|| session.filters.center.clone(), |stop| stop.location());

        let map = self
            .renderer
            .render(&MapRequest::new(center, ITINERARY_ZOOM).with_itinerary(stops));

        let details = theme
            .stops
            .iter()
            .map(|stop| StopDetail {
                ordinal: stop.ordinal,
                name: stop.name.clone(),
                kind: stop.kind,
                symbol: stop.kind.symbol().to_string(),
                description: stop.description.clone(),
                search_link: itinerary::search_link(stop, &self.config.map.city),
            })
            .collect();

        Ok(ItineraryView {
            key: theme.key.to_string(),
            title: theme.title.to_string(),
            map,
            stops: details,
        })
    }

    /// Guestbook and chat panel; unknown places fall back to the
    /// session's selection, then to the first place
    pub fn panel(&self, session: &Session, place: Option<&str>) -> PanelView {
        let places = itinerary::place_names();
        let known = |name: &str| places.iter().any(|p| p == name);

        let selected_place = place
            .filter(|p| known(p))
            .or(session.selected_place.as_deref().filter(|p| known(p)))
            .or(places.first().map(String::as_str))
            .map(str::to_string);

        let entries = selected_place
            .as_deref()
            .map(|p| session.guestbook.entries(p).to_vec())
            .unwrap_or_default();

        PanelView {
            places,
            selected_place,
            entries,
            transcript: session.transcript.clone(),
            assistant_available: self.chat.has_provider(),
        }
    }

    /// Move the explore center to a geocoded address
    pub async fn recenter(&self, session: &mut Session, address: &str) -> RecenterOutcome {
        let Some(geocoder) = &self.geocoder else {
            return unchanged(session, GEOCODING_DISABLED.to_string());
        };

        match geocoder.geocode(address).await {
            Ok(Some(location)) if location.is_valid() => {
                let message = format!("Map centered on {}", location.name);
                session.filters.center = location.clone();
                RecenterOutcome {
                    moved: true,
                    center: location,
                    message,
                }
            }
            Ok(_) => unchanged(session, format!("No match found for '{address}'")),
            Err(e) => {
                warn!("Address search failed: {}", e);
                unchanged(session, "Address search is unavailable right now.".to_string())
            }
        }
    }

    /// Raw place lookup by category name
    pub async fn places(
        &self,
        category: &str,
        lat: f64,
        lng: f64,
        radius_m: u32,
    ) -> Vec<PointOfInterest> {
        self.places.fetch_named(category, lat, lng, radius_m).await
    }
}

fn unchanged(session: &Session, message: String) -> RecenterOutcome {
    RecenterOutcome {
        moved: false,
        center: session.filters.center.clone(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::boundary::tests::{FakeBoundaries, TWO_DISTRICTS};
    use crate::map::style::YL_OR_RD;
    use crate::models::PoiCategory;
    use crate::places::fetcher::tests::{FakeSource, named};
    use crate::session::FilterUpdate;
    use async_trait::async_trait;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct FixedGeocoder(Option<Location>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<Location>> {
            Ok(self.0.clone())
        }
    }

    fn orchestrator(config: GuideConfig, source: Arc<FakeSource>) -> ViewOrchestrator {
        ViewOrchestrator::new(
            config,
            source,
            Arc::new(FakeBoundaries::with(Some(TWO_DISTRICTS))),
            ChatPanel::new(None),
            None,
        )
    }

    fn hotels_only() -> FilterUpdate {
        FilterUpdate {
            crime: Some(false),
            restaurants: Some(false),
            hotels: Some(true),
            radius_m: Some(4000),
            ..FilterUpdate::default()
        }
    }

    #[tokio::test]
    async fn test_hotel_layer_only() {
        let source = Arc::new(FakeSource::with(vec![
            named("Hotel Adlon Kempinski", 52.5159, 13.3801),
            named("Park Inn by Radisson", 52.5230, 13.4118),
        ]));
        let config = GuideConfig::default();
        let views = orchestrator(config.clone(), source.clone());
        let mut session = Session::new("s", &config);
        session.filters.apply(&hotels_only()).unwrap();

        let view = views.explore(&session).await;

        assert_eq!(view.map.center, [52.52, 13.405]);
        assert!(view.map.layer(PoiCategory::Restaurant).is_none());
        assert!(view.map.choropleth.is_none());
        let hotels = view.map.layer(PoiCategory::Hotel).unwrap();
        let labels: Vec<&str> = hotels.markers.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Hotel Adlon Kempinski", "Park Inn by Radisson"]);
        assert!(view.warnings.is_empty());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_still_renders() {
        let config = GuideConfig::default();
        let views = orchestrator(config.clone(), Arc::new(FakeSource::failing()));
        let mut session = Session::new("s", &config);
        session.filters.apply(&hotels_only()).unwrap();

        let view = views.explore(&session).await;

        assert_eq!(view.map.marker_count(), 0);
        assert!(view.map.layer(PoiCategory::Hotel).unwrap().markers.is_empty());
    }

    #[tokio::test]
    async fn test_crime_overlay_and_banner() {
        let mut csv = NamedTempFile::new().unwrap();
        csv.write_all(b"Year,District,Code,Location,Theft\n2012,Mitte,1,A,30\n2012,Pankow,2,B,10\n2012,Reinickendorf,3,C,5\n")
            .unwrap();

        let mut config = GuideConfig::default();
        config.crime.csv_path = csv.path().to_string_lossy().into_owned();
        let views = orchestrator(config.clone(), Arc::new(FakeSource::with(Vec::new())));
        let session = Session::new("s", &config);

        let view = views.explore(&session).await;

        let layer = view.map.choropleth.as_ref().unwrap();
        assert_eq!(layer.matched_regions, 2);
        let mitte = &layer.features.features[0];
        assert_eq!(
            mitte.property("fill_color").and_then(|v| v.as_str()),
            Some(YL_OR_RD[5])
        );
        assert_eq!(view.warnings.len(), 1);
        assert!(view.warnings[0].contains("Reinickendorf"));
        assert!(view.map.layer(PoiCategory::Restaurant).is_some());
    }

    #[tokio::test]
    async fn test_missing_crime_file_banner() {
        let mut config = GuideConfig::default();
        config.crime.csv_path = "no/such/crimes.csv".to_string();
        let views = orchestrator(config.clone(), Arc::new(FakeSource::with(Vec::new())));

        let view = views.explore(&Session::new("s", &config)).await;

        assert!(view.map.choropleth.is_none());
        assert_eq!(view.warnings, vec![CRIME_UNAVAILABLE.to_string()]);
    }

    #[test]
    fn test_itinerary_view() {
        let config = GuideConfig::default();
        let views = orchestrator(config.clone(), Arc::new(FakeSource::with(Vec::new())));
        let session = Session::new("s", &config);

        let view = views.itinerary(&session, "museum-island").unwrap();

        let third = &itinerary::get_stops("museum-island").unwrap()[2];
        assert_eq!(view.map.center, [third.lat, third.lng]);
        assert_eq!(view.map.zoom, 13);
        assert_eq!(view.stops.len(), 6);
        assert_eq!(view.stops[4].symbol, StopKind::Food.symbol());
        assert!(view.stops[0].search_link.ends_with("+Berlin"));
        assert!(views.itinerary(&session, "nope").is_err());
    }

    #[test]
    fn test_panel_selection() {
        let config = GuideConfig::default();
        let views = orchestrator(config.clone(), Arc::new(FakeSource::with(Vec::new())));
        let mut session = Session::new("s", &config);
        session.guestbook.add_entry("KaDeWe", "six floors of food");

        let panel = views.panel(&session, Some("KaDeWe"));
        assert_eq!(panel.selected_place.as_deref(), Some("KaDeWe"));
        assert_eq!(panel.entries.len(), 1);
        assert!(!panel.assistant_available);

        let fallback = views.panel(&session, Some("Atlantis"));
        assert_eq!(fallback.selected_place, fallback.places.first().cloned());
    }

    #[tokio::test]
    async fn test_recenter_without_key() {
        let config = GuideConfig::default();
        let views = orchestrator(config.clone(), Arc::new(FakeSource::with(Vec::new())));
        let mut session = Session::new("s", &config);

        let outcome = views.recenter(&mut session, "Alexanderplatz").await;

        assert!(!outcome.moved);
        assert_eq!(outcome.message, GEOCODING_DISABLED);
        assert_eq!(session.filters.center.lat_lng(), [52.52, 13.405]);
    }

    #[tokio::test]
    async fn test_recenter_with_geocoder() {
        let config = GuideConfig::default();
        let target = Location::new(52.5219, 13.4132, "Alexanderplatz");
        let views = ViewOrchestrator::new(
            config.clone(),
            Arc::new(FakeSource::with(Vec::new())),
            Arc::new(FakeBoundaries::with(None)),
            ChatPanel::new(None),
            Some(Arc::new(FixedGeocoder(Some(target.clone())))),
        );
        let mut session = Session::new("s", &config);

        let outcome = views.recenter(&mut session, "Alexanderplatz").await;

        assert!(outcome.moved);
        assert_eq!(session.filters.center, target);
    }
}
