//! Splits raw comma-delimited location text into hierarchy levels.

use crate::models::{Hierarchy, Level};

/// Privacy markers some genealogy programs wrap around hidden text
const PRIVACY_MARKERS: [&str; 2] = ["[[", "]]"];

/// Output of [`parse`], before any correction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPlace {
    /// Trimmed input, empty for blank input
    pub original_text: String,
    pub hierarchy: Hierarchy,
    /// Deepest level populated by the split
    pub level: Level,
}

/// Split `raw` right to left: country, region, sub-region, address, and
/// everything further left rejoined into the place name.
///
/// Never fails; blank input gives `Level::Unknown` and empty fields.
pub fn parse(raw: &str) -> ParsedPlace {
    let original_text = raw.trim();
    if original_text.is_empty() {
        return ParsedPlace::default();
    }

    let mut text = original_text.to_string();
    for marker in PRIVACY_MARKERS {
        text = text.replace(marker, "");
    }

    let mut parts: Vec<&str> = text.split(',').collect();
    let mut hierarchy = Hierarchy::default();
    let mut level = Level::Unknown;

    for field in hierarchy.fields_mut().into_iter().take(4) {
        let Some(part) = parts.pop() else {
            break;
        };
        *field = part.trim().to_string();
        level = level.deeper();
    }
    if !parts.is_empty() {
        hierarchy.place_name = parts.join(", ").trim().to_string();
        level = Level::Place;
    }

    ParsedPlace {
        original_text: original_text.to_string(),
        hierarchy,
        level,
    }
}
