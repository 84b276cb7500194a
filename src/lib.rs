//! Locus - place-name normalization for genealogy imports
//!
//! Parses free-text place strings into a five-level hierarchy, corrects them
//! against rule tables and interns one place per canonical rendering.

pub mod compare;
pub mod config;
pub mod models;
pub mod normalize;
pub mod phonetic;
pub mod registry;
pub mod rules;

pub use compare::{compare, equals};
pub use config::Settings;
pub use models::{Coordinates, GeocodeRecord, GeocodeStatus, Hierarchy, Level, Place, PlaceId};
pub use registry::{Registry, RegistryStats};
pub use rules::{RuleLoadError, RuleTables};
