//! Normalized place structure.

use serde::{Deserialize, Serialize};

use super::Level;
use crate::normalize::countries;
use crate::normalize::text::NumericKey;

/// Handle to a place interned in a [`Registry`](crate::Registry).
///
/// Two handles are equal exactly when they name the same interned object.
/// The two sentinel handles are valid in every registry epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaceId {
    pub(crate) index: u32,
    pub(crate) epoch: u32,
}

impl PlaceId {
    /// The "Unknown" sentinel
    pub const UNKNOWN: PlaceId = PlaceId { index: 0, epoch: 0 };
    /// The blank-input sentinel
    pub const BLANK: PlaceId = PlaceId { index: 1, epoch: 0 };

    pub fn is_sentinel(&self) -> bool {
        *self == Self::UNKNOWN || *self == Self::BLANK
    }
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.epoch, self.index)
    }
}

/// The five hierarchy fields, most general first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hierarchy {
    pub country: String,
    pub region: String,
    pub sub_region: String,
    pub address: String,
    pub place_name: String,
}

impl Hierarchy {
    pub fn get(&self, level: Level) -> &str {
        match level {
            Level::Unknown => "",
            Level::Country => &self.country,
            Level::Region => &self.region,
            Level::SubRegion => &self.sub_region,
            Level::Address => &self.address,
            Level::Place => &self.place_name,
        }
    }

    pub fn fields(&self) -> [&str; 5] {
        [
            self.country.as_str(),
            self.region.as_str(),
            self.sub_region.as_str(),
            self.address.as_str(),
            self.place_name.as_str(),
        ]
    }

    pub fn fields_mut(&mut self) -> [&mut String; 5] {
        [
            &mut self.country,
            &mut self.region,
            &mut self.sub_region,
            &mut self.address,
            &mut self.place_name,
        ]
    }

    /// Move every field deeper than `level` up by one, overwriting `level`
    /// and leaving the place name empty.
    pub fn shift_up_from(&mut self, level: Level) {
        let Some(start) = level.index() else {
            return;
        };
        let mut fields = self.fields_mut();
        for i in start..4 {
            let next = std::mem::take(&mut *fields[i + 1]);
            *fields[i] = next;
        }
        fields[4].clear();
    }

    /// Push the hierarchy down one level below the country, merging the old
    /// address into the place name, and put `country` on top.
    pub fn push_down(&mut self, country: &str) {
        self.place_name = join_words(&self.place_name, &self.address);
        self.address = std::mem::take(&mut self.sub_region);
        self.sub_region = std::mem::take(&mut self.region);
        self.region = std::mem::replace(&mut self.country, country.to_string());
    }

    /// Same as [`push_down`](Self::push_down) but one level lower: the
    /// country stays and `region` replaces the old region.
    pub fn push_down_region(&mut self, region: &str) {
        self.place_name = join_words(&self.place_name, &self.address);
        self.address = std::mem::take(&mut self.sub_region);
        self.sub_region = std::mem::replace(&mut self.region, region.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|f| f.is_empty())
    }

    /// Display form, deepest first: "Place, Address, SubRegion, Region, Country".
    ///
    /// Empty levels are skipped unless `allow_empty` is set; an empty place
    /// name is always skipped.
    pub fn render(&self, depth: Level, allow_empty: bool) -> String {
        let mut parts = self.included(depth, allow_empty);
        parts.reverse();
        trim_leading_commas(&parts.join(", "))
    }

    /// Sortable form, most general first: "Country, Region, ..., Place".
    pub fn sort_key(&self, depth: Level, allow_empty: bool) -> String {
        trim_leading_commas(&self.included(depth, allow_empty).join(", "))
    }

    /// Fields included at `depth`, country first
    fn included(&self, depth: Level, allow_empty: bool) -> Vec<&str> {
        let mut parts = vec![self.country.as_str()];
        for level in &Level::all()[1..] {
            if depth < *level {
                break;
            }
            let field = self.get(*level);
            let keep_empty = allow_empty && *level != Level::Place;
            if !field.is_empty() || keep_empty {
                parts.push(field);
            }
        }
        parts
    }
}

fn join_words(a: &str, b: &str) -> String {
    format!("{} {}", a, b).trim().to_string()
}

fn trim_leading_commas(s: &str) -> String {
    let mut s = s;
    while let Some(rest) = s.strip_prefix(", ") {
        s = rest;
    }
    s.trim().to_string()
}

/// A parsed and corrected place.
///
/// The hierarchy is fixed once constructed. Geocode state lives in the
/// registry, keyed by [`PlaceId`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub(crate) original_text: String,
    pub(crate) hierarchy: Hierarchy,
    pub(crate) level: Level,
    pub(crate) synthetic: bool,
    pub(crate) allow_empty_levels: bool,
    /// Registry key: the full rendering, or the original text when fixes are skipped
    pub(crate) canonical: String,
}

impl Place {
    /// Untouched input text, empty for synthetic places
    pub fn original_text(&self) -> &str {
        if self.synthetic {
            ""
        } else {
            &self.original_text
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn country(&self) -> &str {
        &self.hierarchy.country
    }

    pub fn region(&self) -> &str {
        &self.hierarchy.region
    }

    pub fn sub_region(&self) -> &str {
        &self.hierarchy.sub_region
    }

    pub fn address(&self) -> &str {
        &self.hierarchy.address
    }

    pub fn place_name(&self) -> &str {
        &self.hierarchy.place_name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn is_blank(&self) -> bool {
        self.hierarchy.country.is_empty()
    }

    /// Key this place is interned under
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Display form truncated to `depth`
    pub fn render(&self, depth: Level) -> String {
        self.hierarchy.render(depth, self.allow_empty_levels)
    }

    /// Sortable form truncated to `depth`
    pub fn sort_key(&self, depth: Level) -> String {
        self.hierarchy.sort_key(depth, self.allow_empty_levels)
    }

    /// Address with any leading house number moved to the end
    pub fn address_numeric(&self) -> String {
        NumericKey::new(&self.hierarchy.address).sortable()
    }

    pub fn address_without_number(&self) -> &str {
        NumericKey::new(&self.hierarchy.address).without_number()
    }

    pub fn place_name_numeric(&self) -> String {
        NumericKey::new(&self.hierarchy.place_name).sortable()
    }

    pub fn place_name_without_number(&self) -> &str {
        NumericKey::new(&self.hierarchy.place_name).without_number()
    }

    pub fn is_united_kingdom(&self) -> bool {
        countries::is_united_kingdom(&self.hierarchy.country)
    }

    pub fn is_england_wales(&self) -> bool {
        countries::is_england_wales(&self.hierarchy.country)
    }

    /// Census system this place belongs to
    pub fn census_country(&self) -> &str {
        countries::census_country(&self.hierarchy.country)
    }

    pub fn is_known_country(&self) -> bool {
        countries::is_known_country(&self.hierarchy.country)
    }

    /// Whether this place can appear in a census taken in `census`
    pub fn census_country_matches(&self, census: &str, include_unknown_countries: bool) -> bool {
        countries::census_country_matches(&self.hierarchy.country, census, include_unknown_countries)
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}
