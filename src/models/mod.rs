//! Data models for the city guide
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and distance helpers
//! - Poi: Places returned by the map data service
//! - Itinerary: Curated stops of the themed routes
//! - Crime: Per-district incident totals

pub mod crime;
pub mod itinerary;
pub mod location;
pub mod poi;

pub use crime::RegionCrimeAggregate;
pub use itinerary::{ItineraryStop, StopKind};
pub use location::Location;
pub use poi::{DEFAULT_CUISINE, PoiCategory, PointOfInterest};
