//! Itinerary stop model

use serde::{Deserialize, Serialize};

use super::Location;

/// What a stop is about; drives the marker style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    View,
    Walk,
    Food,
}

impl StopKind {
    /// Emoji shown in the stop list
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            StopKind::Food => "🍽️",
            StopKind::View => "📸",
            StopKind::Walk => "🚶",
        }
    }
}

/// One curated location within a themed route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryStop {
    /// 1-based position within the theme
    pub ordinal: u8,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub kind: StopKind,
    pub description: String,
}

impl ItineraryStop {
    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(self.lat, self.lng, self.name.clone())
    }

    /// Name prefixed with the ordinal, e.g. "3. Cafe am Neuen See"
    #[must_use]
    pub fn numbered_name(&self) -> String {
        format!("{}. {}", self.ordinal, self.name)
    }
}
