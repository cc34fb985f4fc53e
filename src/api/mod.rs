use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::guestbook::GuestbookEntry;
use crate::itinerary;
use crate::models::PointOfInterest;
use crate::session::{
    FilterUpdate, MapFilters, SessionHandle, SessionStore, validate_center, validate_radius,
};
use crate::views::{ExploreView, ItineraryView, PanelView, RecenterOutcome, ViewOrchestrator};
use crate::{GuideError, map};

#[derive(Clone)]
pub struct AppState {
    pub views: Arc<ViewOrchestrator>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(views: ViewOrchestrator) -> Self {
        let sessions = SessionStore::new(views.config().clone());
        Self {
            views: Arc::new(views),
            sessions: Arc::new(sessions),
        }
    }

    fn session(&self, id: &str) -> Result<SessionHandle, StatusCode> {
        self.sessions.get(id).map_err(|e| status_of(&e))
    }
}

#[derive(Serialize, Deserialize)]
pub struct ApiSession {
    pub id: String,
}

#[derive(Serialize, Deserialize)]
pub struct ApiTheme {
    pub key: String,
    pub title: String,
    pub stops: usize,
}

#[derive(Deserialize)]
pub struct RecenterRequest {
    pub address: String,
}

#[derive(Deserialize)]
pub struct EntryRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Deserialize)]
pub struct PanelQuery {
    pub place: Option<String>,
}

#[derive(Deserialize)]
pub struct PlacesQuery {
    pub category: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<u32>,
}

fn status_of(error: &GuideError) -> StatusCode {
    match error {
        GuideError::NotFound { .. } => StatusCode::NOT_FOUND,
        GuideError::Config { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn known_place(place: &str) -> Result<(), StatusCode> {
    if itinerary::place_names().iter().any(|p| p == place) {
        Ok(())
    } else {
        debug!("Unknown guestbook place '{}'", place);
        Err(StatusCode::NOT_FOUND)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", delete(end_session))
        .route("/sessions/{id}/explore", get(get_explore))
        .route("/sessions/{id}/explore/map.html", get(get_explore_map))
        .route("/sessions/{id}/filters", put(update_filters))
        .route("/sessions/{id}/recenter", post(recenter))
        .route("/sessions/{id}/themes/{key}", get(get_itinerary))
        .route("/sessions/{id}/themes/{key}/map.html", get(get_itinerary_map))
        .route("/sessions/{id}/panel", get(get_panel))
        .route("/sessions/{id}/guestbook/{place}", post(add_entry))
        .route("/sessions/{id}/guestbook/{place}/{index}", delete(delete_entry))
        .route("/sessions/{id}/chat", post(chat))
        .route("/themes", get(get_themes))
        .route("/places", get(get_places))
        .with_state(state)
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<ApiSession>) {
    let (id, _) = state.sessions.create();
    (StatusCode::CREATED, Json(ApiSession { id }))
}

async fn end_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.sessions.end(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn get_explore(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExploreView>, StatusCode> {
    let handle = state.session(&id)?;
    let session = handle.lock().await;
    Ok(Json(state.views.explore(&session).await))
}

async fn get_explore_map(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let handle = state.session(&id)?;
    let session = handle.lock().await;
    let view = state.views.explore(&session).await;
    let title = format!("Explore {}", state.views.config().map.city);
    map::render_html(&title, &view.map)
        .map(Html)
        .map_err(|e| status_of(&e))
}

async fn update_filters(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<FilterUpdate>,
) -> Result<Json<MapFilters>, StatusCode> {
    let handle = state.session(&id)?;
    let mut session = handle.lock().await;
    session
        .filters
        .apply(&update)
        .map_err(|e| status_of(&e))?;
    Ok(Json(session.filters.clone()))
}

async fn recenter(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RecenterRequest>,
) -> Result<Json<RecenterOutcome>, StatusCode> {
    let handle = state.session(&id)?;
    let mut session = handle.lock().await;
    Ok(Json(state.views.recenter(&mut session, &request.address).await))
}

async fn get_themes() -> Json<Vec<ApiTheme>> {
    Json(
        itinerary::themes()
            .iter()
            .map(|theme| ApiTheme {
                key: theme.key.to_string(),
                title: theme.title.to_string(),
                stops: theme.stops.len(),
            })
            .collect(),
    )
}

async fn get_itinerary(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
) -> Result<Json<ItineraryView>, StatusCode> {
    let handle = state.session(&id)?;
    let mut session = handle.lock().await;
    let view = state
        .views
        .itinerary(&session, &key)
        .map_err(|e| status_of(&e))?;
    session.selected_theme = Some(view.key.clone());
    Ok(Json(view))
}

async fn get_itinerary_map(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
) -> Result<Html<String>, StatusCode> {
    let handle = state.session(&id)?;
    let session = handle.lock().await;
    let view = state
        .views
        .itinerary(&session, &key)
        .map_err(|e| status_of(&e))?;
    map::render_html(&view.title, &view.map)
        .map(Html)
        .map_err(|e| status_of(&e))
}

async fn get_panel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PanelQuery>,
) -> Result<Json<PanelView>, StatusCode> {
    let handle = state.session(&id)?;
    let mut session = handle.lock().await;
    let view = state.views.panel(&session, query.place.as_deref());
    session.selected_place = view.selected_place.clone();
    Ok(Json(view))
}

async fn add_entry(
    State(state): State<AppState>,
    Path((id, place)): Path<(String, String)>,
    Json(request): Json<EntryRequest>,
) -> Result<Json<Vec<GuestbookEntry>>, StatusCode> {
    known_place(&place)?;
    let handle = state.session(&id)?;
    let mut session = handle.lock().await;
    session.guestbook.add_entry(&place, request.text);
    Ok(Json(session.guestbook.entries(&place).to_vec()))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path((id, place, index)): Path<(String, String, usize)>,
) -> Result<Json<Vec<GuestbookEntry>>, StatusCode> {
    known_place(&place)?;
    let handle = state.session(&id)?;
    let mut session = handle.lock().await;
    session.guestbook.delete_entry(&place, index);
    Ok(Json(session.guestbook.entries(&place).to_vec()))
}

async fn chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, StatusCode> {
    let handle = state.session(&id)?;
    let mut session = handle.lock().await;
    let reply = state.views.chat().ask(&mut session, &request.prompt).await;
    Ok(Json(ChatReply { reply }))
}

async fn get_places(
    State(state): State<AppState>,
    Query(query): Query<PlacesQuery>,
) -> Result<Json<Vec<PointOfInterest>>, StatusCode> {
    let defaults = &state.views.config().map;
    let radius = query.radius.unwrap_or(defaults.radius_m);
    validate_radius(radius).map_err(|e| status_of(&e))?;
    let center = validate_center(
        query.lat.unwrap_or(defaults.center_lat),
        query.lng.unwrap_or(defaults.center_lng),
    )
    .map_err(|e| status_of(&e))?;

    let places = state
        .views
        .places(&query.category, center.latitude, center.longitude, radius)
        .await;
    Ok(Json(places))
}
