//! Core data models for place normalization.

pub mod geocode;
pub mod level;
pub mod place;

pub use geocode::{Coordinates, GeocodeRecord, GeocodeStatus};
pub use level::Level;
pub use place::{Hierarchy, Place, PlaceId};
