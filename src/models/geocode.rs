//! Geocode status tracking for places.
//!
//! The enrichment collaborator owns these fields; the registry only seeds them
//! from import records and applies the merge rule in
//! [`GeocodeRecord::merge_from_source`].

use serde::{Deserialize, Serialize};

use super::Level;

/// Confidence / provenance of a place's coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeStatus {
    Unknown,
    #[default]
    NotSearched,
    Matched,
    PartialMatch,
    /// Coordinates came from the source record or a prior user correction
    GedcomUser,
    NoMatch,
    /// User explicitly marked the geocode as wrong
    Incorrect,
    OutOfBounds,
    LevelMismatch,
    /// Gazetteer exact match
    GazetteerMatch,
    GazetteerPartial,
    GazetteerFuzzy,
}

impl GeocodeStatus {
    /// Display text for this status
    pub fn description(&self) -> &'static str {
        match self {
            GeocodeStatus::Unknown => "Unknown",
            GeocodeStatus::NotSearched => "Not Searched",
            GeocodeStatus::Matched => "Geocoder Matched",
            GeocodeStatus::PartialMatch => "Partial Match (Geocoder)",
            GeocodeStatus::GedcomUser => "GEDCOM/User Data",
            GeocodeStatus::NoMatch => "No Match",
            GeocodeStatus::Incorrect => "Incorrect (User Marked)",
            GeocodeStatus::OutOfBounds => "Outside Country Area",
            GeocodeStatus::LevelMismatch => "Partial Match (Levels)",
            GeocodeStatus::GazetteerMatch => "Gazetteer Match",
            GeocodeStatus::GazetteerPartial => "Partial Match (Gazetteer)",
            GeocodeStatus::GazetteerFuzzy => "Fuzzy Match (Gazetteer)",
        }
    }

    fn is_partial(&self) -> bool {
        matches!(
            self,
            GeocodeStatus::PartialMatch
                | GeocodeStatus::LevelMismatch
                | GeocodeStatus::GazetteerPartial
        )
    }

    fn is_full(&self) -> bool {
        matches!(
            self,
            GeocodeStatus::Matched
                | GeocodeStatus::GedcomUser
                | GeocodeStatus::GazetteerMatch
                | GeocodeStatus::GazetteerFuzzy
        )
    }
}

impl std::fmt::Display for GeocodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Latitude / longitude pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parse GEDCOM style coordinate text.
    ///
    /// Hemisphere prefixes are folded into the sign (`S`/`W` negative). Text
    /// that still isn't a number becomes `0.0`.
    pub fn parse(latitude: &str, longitude: &str) -> Self {
        let lat = latitude.trim().replace('N', "").replace('S', "-");
        let lon = longitude.trim().replace('W', "-").replace('E', "");
        Self {
            latitude: lat.trim().parse().unwrap_or(0.0),
            longitude: lon.trim().parse().unwrap_or(0.0),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Within +/-90 latitude and +/-180 longitude
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn is_within_uk_bounds(&self) -> bool {
        (-7.974074..=1.879409).contains(&self.longitude)
            && (49.814376..=60.970872).contains(&self.latitude)
    }
}

/// Mutable geocode state kept alongside an interned place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeRecord {
    pub status: GeocodeStatus,
    pub coordinates: Coordinates,
    /// Projected pair produced by an external transform, carried as-is
    pub projected: Coordinates,
    /// Reverse-geocode result
    pub found_location: String,
    pub found_result_type: String,
    pub found_level: Option<Level>,
    /// Coordinates were supplied by the import record
    pub from_source: bool,
}

impl GeocodeRecord {
    pub fn new(status: GeocodeStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Seed a record from import data. A record that arrives with
    /// coordinates but no search status is treated as user data.
    pub fn from_source(coordinates: Coordinates, status: GeocodeStatus) -> Self {
        let status = if status == GeocodeStatus::NotSearched && !coordinates.is_zero() {
            GeocodeStatus::GedcomUser
        } else {
            status
        };
        Self {
            status,
            coordinates,
            from_source: !coordinates.is_zero(),
            ..Self::default()
        }
    }

    /// Whether the coordinates can be trusted.
    ///
    /// Partial statuses only count when `include_partials` is set and the
    /// caller isn't asking for a full recheck.
    pub fn is_geocoded(&self, recheck_partials: bool, include_partials: bool) -> bool {
        if self.status == GeocodeStatus::Unknown {
            return true;
        }
        if self.coordinates.is_zero() {
            return false;
        }
        if !recheck_partials && include_partials && self.status.is_partial() {
            return true;
        }
        self.status.is_full()
    }

    pub fn needs_reverse_geocoding(&self) -> bool {
        self.found_location.is_empty()
            && matches!(
                self.status,
                GeocodeStatus::GedcomUser
                    | GeocodeStatus::GazetteerMatch
                    | GeocodeStatus::GazetteerPartial
                    | GeocodeStatus::GazetteerFuzzy
            )
    }

    /// Same latitude and longitude. The projected pair is derived data and
    /// takes no part in the comparison.
    pub fn coordinates_match(&self, other: &GeocodeRecord) -> bool {
        self.coordinates == other.coordinates
    }

    /// Apply newer source coordinates under the merge rule.
    ///
    /// Overwrites when this record isn't geocoded but the incoming one is, or
    /// when the coordinates differ. Incoming records without coordinates never
    /// overwrite, and the projected pair is only replaced by a non-zero one.
    /// Returns true if the record changed.
    pub fn merge_from_source(&mut self, incoming: &GeocodeRecord, include_partials: bool) -> bool {
        if incoming.coordinates.is_zero() {
            return false;
        }
        let upgrade = !self.is_geocoded(true, include_partials)
            && incoming.is_geocoded(true, include_partials);
        if !upgrade && self.coordinates_match(incoming) {
            return false;
        }
        self.coordinates = incoming.coordinates;
        if !incoming.projected.is_zero() {
            self.projected = incoming.projected;
        }
        self.from_source = true;
        self.mark_user_data();
        true
    }

    /// Result of a forward geocode by the enrichment collaborator
    pub fn apply_enrichment(
        &mut self,
        status: GeocodeStatus,
        coordinates: Coordinates,
        projected: Coordinates,
    ) {
        self.status = status;
        self.coordinates = coordinates;
        self.projected = projected;
    }

    pub fn set_reverse_geocode(
        &mut self,
        found_location: impl Into<String>,
        result_type: impl Into<String>,
        level: Option<Level>,
    ) {
        self.found_location = found_location.into();
        self.found_result_type = result_type.into();
        self.found_level = level;
    }

    pub fn mark_incorrect(&mut self) {
        self.status = GeocodeStatus::Incorrect;
    }

    fn mark_user_data(&mut self) {
        self.status = GeocodeStatus::GedcomUser;
        self.found_location.clear();
        self.found_result_type.clear();
        self.found_level = None;
    }
}
