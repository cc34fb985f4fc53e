//! `cityguide` - travel-guide dashboard for a single city
//!
//! This library provides points-of-interest lookup, a district crime
//! overlay, curated itineraries, map composition and the visitor panel
//! (guestbook and assistant chat) behind an HTTP API.

pub mod api;
pub mod cache;
pub mod chat;
pub mod cli;
pub mod config;
pub mod crime;
pub mod error;
pub mod geocode;
pub mod guestbook;
pub mod itinerary;
pub mod logging;
pub mod map;
pub mod models;
pub mod places;
pub mod session;
pub mod views;
pub mod web;

// Re-export core types for public API
pub use chat::{ChatPanel, ChatRole, ChatTurn, CompletionProvider, GeminiClient};
pub use config::GuideConfig;
pub use crime::CrimeLoader;
pub use error::GuideError;
pub use guestbook::Guestbook;
pub use map::{MapRenderer, MapRequest, MapView};
pub use models::{ItineraryStop, Location, PoiCategory, PointOfInterest, RegionCrimeAggregate};
pub use places::{OverpassClient, PlaceSource, PoiFetcher};
pub use session::{Session, SessionStore};
pub use views::ViewOrchestrator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, GuideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
