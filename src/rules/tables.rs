//! Immutable correction tables consumed by the pipeline.

use hashbrown::HashMap;
use tracing::{info, warn};

use super::geocoder::{FixLevel, GeocoderFixes};
use crate::normalize::text::title_case;

/// String mapping with the exact-then-title-case lookup the pipeline uses.
///
/// The title-case fallback is answered from a lower-cased index over the keys
/// that are already in title case, built once at insert time.
#[derive(Debug, Clone, Default)]
pub struct TypoMap {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
}

impl TypoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping. Returns false if the key was already present, in
    /// which case the first mapping is kept.
    pub fn insert(&mut self, from: &str, to: &str) -> bool {
        if self.exact.contains_key(from) {
            return false;
        }
        let lower = from.to_lowercase();
        if title_case(&lower) == from {
            self.folded.entry(lower).or_insert_with(|| to.to_string());
        }
        self.exact.insert(from.to_string(), to.to_string());
        true
    }

    pub fn contains_key(&self, from: &str) -> bool {
        self.exact.contains_key(from)
    }

    /// Exact lookup, falling back to the title-cased form of `key`.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.exact
            .get(key)
            .or_else(|| self.folded.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.exact.keys().map(String::as_str)
    }
}

/// FindMyPast search code for a county
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindMyPastCode {
    pub country: String,
    pub code: String,
}

/// All rule tables, read-only once built.
#[derive(Debug, Clone, Default)]
pub struct RuleTables {
    pub(crate) country_typos: TypoMap,
    pub(crate) region_typos: TypoMap,
    pub(crate) country_shifts: TypoMap,
    pub(crate) region_shifts: TypoMap,
    pub(crate) freecen: HashMap<String, String>,
    pub(crate) findmypast: HashMap<String, FindMyPastCode>,
    pub(crate) geocoder_fixes: GeocoderFixes,
}

impl RuleTables {
    pub fn builder() -> RuleTablesBuilder {
        RuleTablesBuilder::default()
    }

    pub fn country_typo(&self, country: &str) -> Option<&str> {
        self.country_typos.lookup(country)
    }

    pub fn region_typo(&self, region: &str) -> Option<&str> {
        self.region_typos.lookup(region)
    }

    pub fn country_shift(&self, country: &str) -> Option<&str> {
        self.country_shifts.lookup(country)
    }

    pub fn region_shift(&self, region: &str) -> Option<&str> {
        self.region_shifts.lookup(region)
    }

    /// FreeCEN county code, "all" when the region isn't a known county
    pub fn freecen_code(&self, region: &str) -> &str {
        self.freecen.get(region).map(String::as_str).unwrap_or("all")
    }

    pub fn findmypast_code(&self, region: &str) -> Option<&FindMyPastCode> {
        self.findmypast.get(region)
    }

    pub fn geocoder_fixes(&self) -> &GeocoderFixes {
        &self.geocoder_fixes
    }

    pub fn is_empty(&self) -> bool {
        self.country_typos.is_empty()
            && self.region_typos.is_empty()
            && self.country_shifts.is_empty()
            && self.region_shifts.is_empty()
            && self.freecen.is_empty()
            && self.findmypast.is_empty()
            && self.geocoder_fixes.is_empty()
    }
}

/// Collects rule rows, warning about duplicate keys.
///
/// First row wins for every table. City-add-country rows are kept apart until
/// [`build`](RuleTablesBuilder::build) merges them into the country shifts.
#[derive(Debug, Default)]
pub struct RuleTablesBuilder {
    tables: RuleTables,
    city_add_country: Vec<(String, String)>,
    duplicates: usize,
}

impl RuleTablesBuilder {
    pub fn country_typo(&mut self, from: &str, to: &str) -> &mut Self {
        if !from.is_empty() && !to.is_empty() && !self.tables.country_typos.insert(from, to) {
            self.duplicate("country typo", from);
        }
        self
    }

    pub fn region_typo(&mut self, from: &str, to: &str) -> &mut Self {
        if !from.is_empty() && !to.is_empty() && !self.tables.region_typos.insert(from, to) {
            self.duplicate("region typo", from);
        }
        self
    }

    /// Administrative code expansions share the region typo table
    pub fn chapman_code(&mut self, code: &str, county: &str) -> &mut Self {
        if !code.is_empty() && !county.is_empty() && !self.tables.region_typos.insert(code, county)
        {
            self.duplicate("region typo (chapman code)", code);
        }
        self
    }

    /// `region` is a value found in the country field that belongs to `country`
    pub fn country_shift(&mut self, region: &str, country: &str) -> &mut Self {
        if !region.is_empty()
            && !country.is_empty()
            && !self.tables.country_shifts.insert(region, country)
        {
            self.duplicate("country shift", region);
        }
        self
    }

    pub fn city_add_country(&mut self, city: &str, country: &str) -> &mut Self {
        if city.is_empty() || country.is_empty() {
            return self;
        }
        if self.city_add_country.iter().any(|(c, _)| c == city) {
            self.duplicate("city add country", city);
            return self;
        }
        if self.tables.country_shifts.contains_key(city) {
            self.duplicate("city in country shift", city);
        }
        self.city_add_country
            .push((city.to_string(), country.to_string()));
        self
    }

    /// `parish` is a value found in the region field that belongs to `region`
    pub fn region_shift(&mut self, parish: &str, region: &str) -> &mut Self {
        if !parish.is_empty() && !region.is_empty() && !self.tables.region_shifts.insert(parish, region)
        {
            self.duplicate("region shift", parish);
        }
        self
    }

    pub fn freecen(&mut self, county: &str, code: &str) -> &mut Self {
        if county.is_empty() || code.is_empty() {
            return self;
        }
        if self.tables.freecen.contains_key(county) {
            self.duplicate("freecen lookup", county);
        } else {
            self.tables
                .freecen
                .insert(county.to_string(), code.to_string());
        }
        self
    }

    pub fn findmypast(&mut self, county: &str, country: &str, code: &str) -> &mut Self {
        if county.is_empty() || code.is_empty() {
            return self;
        }
        if self.tables.findmypast.contains_key(county) {
            self.duplicate("findmypast lookup", county);
        } else {
            self.tables.findmypast.insert(
                county.to_string(),
                FindMyPastCode {
                    country: country.to_string(),
                    code: code.to_string(),
                },
            );
        }
        self
    }

    pub fn geocoder_fix(&mut self, level: FixLevel, from: &str, to: &str) -> &mut Self {
        self.tables.geocoder_fixes.insert(level, from, to);
        self
    }

    /// Number of duplicate rows discarded so far
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    fn duplicate(&mut self, table: &str, key: &str) {
        self.duplicates += 1;
        warn!("Duplicate {} ignored: {}", table, key);
    }

    pub fn build(mut self) -> RuleTables {
        for (city, country) in std::mem::take(&mut self.city_add_country) {
            // An existing country shift keeps precedence
            self.tables.country_shifts.insert(&city, &country);
        }

        let t = &self.tables;
        info!(
            "Rule tables: {} country typos, {} region typos, {} country shifts, {} region shifts, {} geocoder fixes ({} duplicates ignored)",
            t.country_typos.len(),
            t.region_typos.len(),
            t.country_shifts.len(),
            t.region_shifts.len(),
            t.geocoder_fixes.len(),
            self.duplicates
        );
        self.tables
    }
}
