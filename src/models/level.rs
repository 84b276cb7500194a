//! Hierarchy levels of a place string.

use serde::{Deserialize, Serialize};

/// Specificity of a location, most general first.
///
/// `Unknown` sorts before every populated level so that `level > Level::Country`
/// style checks read the same way they do for the populated levels.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Nothing was parsed
    #[default]
    Unknown,
    /// Country (last comma segment)
    Country,
    /// Region / state / county
    Region,
    /// Sub-region / parish / district
    SubRegion,
    /// Street address
    Address,
    /// Place name, everything left of the address
    Place,
}

impl Level {
    /// All populated levels in hierarchical order (country first)
    pub fn all() -> &'static [Level] {
        &[
            Level::Country,
            Level::Region,
            Level::SubRegion,
            Level::Address,
            Level::Place,
        ]
    }

    /// Zero-based index into a five-field hierarchy, `None` for `Unknown`
    pub fn index(&self) -> Option<usize> {
        match self {
            Level::Unknown => None,
            Level::Country => Some(0),
            Level::Region => Some(1),
            Level::SubRegion => Some(2),
            Level::Address => Some(3),
            Level::Place => Some(4),
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }

    /// Next deeper level, saturating at `Place`
    pub fn deeper(&self) -> Self {
        match self {
            Level::Unknown => Level::Country,
            Level::Country => Level::Region,
            Level::Region => Level::SubRegion,
            Level::SubRegion => Level::Address,
            Level::Address | Level::Place => Level::Place,
        }
    }

    /// Next shallower level; `Country` becomes `Unknown`
    pub fn shallower(&self) -> Self {
        match self {
            Level::Unknown | Level::Country => Level::Unknown,
            Level::Region => Level::Country,
            Level::SubRegion => Level::Region,
            Level::Address => Level::SubRegion,
            Level::Place => Level::Address,
        }
    }

    /// Get the field name for this level
    pub fn field_name(&self) -> &'static str {
        match self {
            Level::Unknown => "unknown",
            Level::Country => "country",
            Level::Region => "region",
            Level::SubRegion => "sub_region",
            Level::Address => "address",
            Level::Place => "place",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}
