//! Visitor sessions
//!
//! Every visitor gets an isolated [`Session`] holding their guestbook, chat
//! transcript and map filters. Sessions are kept in memory until ended or
//! left idle for longer than the configured timeout.

use chrono::{DateTime, Duration, Utc};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::chat::ChatTurn;
use crate::config::GuideConfig;
use crate::guestbook::Guestbook;
use crate::models::{Location, PoiCategory};
use crate::{GuideError, Result};

pub const MAX_RADIUS_M: u32 = 50_000;

/// Reject search radii outside `1..=MAX_RADIUS_M`
pub fn validate_radius(radius: u32) -> Result<()> {
    if radius == 0 || radius > MAX_RADIUS_M {
        return Err(GuideError::config(format!(
            "Radius must be between 1 and {MAX_RADIUS_M} meters, got {radius}"
        )));
    }
    Ok(())
}

/// Build a map center, rejecting out-of-range or non-numeric coordinates
pub fn validate_center(lat: f64, lng: f64) -> Result<Location> {
    let center = Location::new(lat, lng, format!("{lat:.4}, {lng:.4}"));
    if !center.is_valid() {
        return Err(GuideError::config(format!(
            "Invalid coordinates: {}",
            center.format_coordinates()
        )));
    }
    Ok(center)
}

/// Layer toggles and search area of the explore map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFilters {
    pub crime: bool,
    pub restaurants: bool,
    pub hotels: bool,
    pub attractions: bool,
    pub center: Location,
    pub radius_m: u32,
}

impl MapFilters {
    #[must_use]
    pub fn from_config(config: &GuideConfig) -> Self {
        Self {
            crime: true,
            restaurants: true,
            hotels: false,
            attractions: false,
            center: Location::new(
                config.map.center_lat,
                config.map.center_lng,
                format!("{} center", config.map.city),
            ),
            radius_m: config.map.radius_m,
        }
    }

    /// Enabled place layers in a fixed order
    #[must_use]
    pub fn enabled_categories(&self) -> Vec<PoiCategory> {
        PoiCategory::ALL
            .into_iter()
            .filter(|category| self.is_enabled(*category))
            .collect()
    }

    #[must_use]
    pub fn is_enabled(&self, category: PoiCategory) -> bool {
        match category {
            PoiCategory::Restaurant => self.restaurants,
            PoiCategory::Hotel => self.hotels,
            PoiCategory::Attraction => self.attractions,
        }
    }

    /// Apply a partial update; nothing changes when any field is invalid
    pub fn apply(&mut self, update: &FilterUpdate) -> Result<()> {
        if let Some(radius) = update.radius_m {
            validate_radius(radius)?;
        }
        let center = match (update.lat, update.lng) {
            (Some(lat), Some(lng)) => Some(validate_center(lat, lng)?),
            (None, None) => None,
            _ => return Err(GuideError::config("A new center needs both lat and lng")),
        };

        if let Some(center) = center {
            self.center = center;
        }

        let toggles = [
            (&mut self.crime, update.crime),
            (&mut self.restaurants, update.restaurants),
            (&mut self.hotels, update.hotels),
            (&mut self.attractions, update.attractions),
        ];
        for (flag, value) in toggles {
            if let Some(value) = value {
                *flag = value;
            }
        }
        if let Some(radius) = update.radius_m {
            self.radius_m = radius;
        }
        Ok(())
    }
}

/// Partial filter change; absent fields stay as they are
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterUpdate {
    pub crime: Option<bool>,
    pub restaurants: Option<bool>,
    pub hotels: Option<bool>,
    pub attractions: Option<bool>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_m: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub filters: MapFilters,
    pub guestbook: Guestbook,
    pub transcript: Vec<ChatTurn>,
    pub selected_theme: Option<String>,
    pub selected_place: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>, config: &GuideConfig) -> Self {
        Self {
            id: id.into(),
            started_at: Utc::now(),
            filters: MapFilters::from_config(config),
            guestbook: Guestbook::new(),
            transcript: Vec::new(),
            selected_theme: None,
            selected_place: None,
        }
    }
}

pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

struct Slot {
    handle: SessionHandle,
    last_seen: DateTime<Utc>,
}

/// In-memory session registry
pub struct SessionStore {
    config: GuideConfig,
    idle_timeout: Duration,
    sessions: Mutex<HashMap<String, Slot>>,
}

impl SessionStore {
    pub fn new(config: GuideConfig) -> Self {
        let idle_timeout = Duration::minutes(config.server.session_idle_minutes.into());
        Self {
            config,
            idle_timeout,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop sessions not seen since `now - idle_timeout`; returns how many went
    pub fn prune_idle(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.idle_timeout;
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, slot| slot.last_seen > cutoff);
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!("Discarded {} idle sessions", pruned);
        }
        pruned
    }

    fn new_id() -> String {
        let raw: u64 = rand::rng().random();
        format!("{raw:016x}")
    }

    /// Start a fresh session, discarding idle ones first
    pub fn create(&self) -> (String, SessionHandle) {
        let now = Utc::now();
        self.prune_idle(now);
        let mut sessions = self.lock();
        let id = loop {
            let candidate = Self::new_id();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let handle = Arc::new(tokio::sync::Mutex::new(Session::new(id.clone(), &self.config)));
        sessions.insert(
            id.clone(),
            Slot {
                handle: handle.clone(),
                last_seen: now,
            },
        );
        info!("Started session {} ({} active)", id, sessions.len());
        (id, handle)
    }

    /// Look up a session and mark it as seen
    pub fn get(&self, id: &str) -> Result<SessionHandle> {
        let mut sessions = self.lock();
        let slot = sessions
            .get_mut(id)
            .ok_or_else(|| GuideError::not_found(format!("session '{id}'")))?;
        slot.last_seen = Utc::now();
        Ok(slot.handle.clone())
    }

    /// Discard a session; `false` if it did not exist
    pub fn end(&self, id: &str) -> bool {
        let removed = self.lock().remove(id).is_some();
        debug!("Ended session {}: {}", id, removed);
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
