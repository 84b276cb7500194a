//! Correction rule tables.
//!
//! Tables are loaded once per session and only read afterwards.

pub mod geocoder;
mod loader;
mod tables;

pub use geocoder::{FixLevel, GeocoderFixes, LayeredFixes};
pub use loader::{RuleFile, RuleLoadError};
pub use tables::{FindMyPastCode, RuleTables, RuleTablesBuilder, TypoMap};
