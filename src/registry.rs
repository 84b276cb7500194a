//! Session-scoped interning of places.
//!
//! Every distinct canonical rendering maps to exactly one [`PlaceId`] per
//! epoch. Interning a place also interns every shallower ancestor, so
//! [`Registry::at_level`] always lands on an existing entry.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Settings;
use crate::models::{Coordinates, GeocodeRecord, GeocodeStatus, Hierarchy, Level, Place, PlaceId};
use crate::normalize::countries::UNKNOWN_COUNTRY;
use crate::normalize::Pipeline;
use crate::rules::{FixLevel, GeocoderFixes, LayeredFixes, RuleTables};

/// Counts over the live places of a session, Unknown sentinel excluded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub locations: usize,
    pub geocoded: usize,
    /// Places resolved from import records
    pub sourced: usize,
    pub sourced_with_coordinates: usize,
}

#[derive(Debug)]
pub struct Registry {
    settings: Settings,
    rules: Option<RuleTables>,
    user_fixes: Option<GeocoderFixes>,
    places: Vec<Place>,
    geocodes: Vec<GeocodeRecord>,
    canonical: HashMap<String, u32>,
    /// Raw input text already seen, for re-lookup without re-parsing
    aliases: HashMap<String, u32>,
    epoch: u32,
    session_started: DateTime<Utc>,
}

impl Registry {
    /// Create a registry, loading rule tables from `settings.rules`.
    pub fn new(settings: Settings) -> Self {
        let rules = load_rules(&settings);
        Self::with_rules(settings, rules)
    }

    /// Create a registry with tables already in memory; `None` runs the
    /// pipeline in pass-through mode.
    pub fn with_rules(settings: Settings, rules: Option<RuleTables>) -> Self {
        let user_fixes = load_user_fixes(&settings);
        let mut registry = Self {
            settings,
            rules,
            user_fixes,
            places: Vec::new(),
            geocodes: Vec::new(),
            canonical: HashMap::new(),
            aliases: HashMap::new(),
            epoch: 1,
            session_started: Utc::now(),
        };
        registry.seed_sentinels();
        registry
    }

    fn seed_sentinels(&mut self) {
        self.places.clear();
        self.geocodes.clear();
        self.canonical.clear();
        self.aliases.clear();

        let unknown = Place {
            original_text: String::new(),
            hierarchy: Hierarchy {
                country: UNKNOWN_COUNTRY.to_string(),
                ..Hierarchy::default()
            },
            level: Level::Country,
            synthetic: true,
            allow_empty_levels: self.settings.allow_empty_levels,
            canonical: UNKNOWN_COUNTRY.to_string(),
        };
        let blank = Place {
            original_text: String::new(),
            hierarchy: Hierarchy::default(),
            level: Level::Unknown,
            synthetic: true,
            allow_empty_levels: self.settings.allow_empty_levels,
            canonical: String::new(),
        };
        self.places.push(unknown);
        self.geocodes.push(GeocodeRecord::new(GeocodeStatus::Unknown));
        self.places.push(blank);
        self.geocodes.push(GeocodeRecord::new(GeocodeStatus::GedcomUser));
        self.canonical
            .insert(UNKNOWN_COUNTRY.to_string(), PlaceId::UNKNOWN.index);
    }

    /// Start a new session: drop every place but the sentinels and reload
    /// rule tables. Ids handed out before the reset stop resolving.
    pub fn reset(&mut self) {
        if self.settings.rules.is_some() {
            self.rules = load_rules(&self.settings);
        }
        self.user_fixes = load_user_fixes(&self.settings);
        self.seed_sentinels();
        self.epoch = self.epoch.wrapping_add(1).max(1);
        self.session_started = Utc::now();
        info!(
            "Registry reset, epoch {}, location fixes {}",
            self.epoch,
            if self.rules.is_some() { "enabled" } else { "disabled" }
        );
    }

    fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(&self.settings, self.rules.as_ref())
    }

    /// Get or create the place for `raw`.
    pub fn resolve(&mut self, raw: &str) -> PlaceId {
        self.get_or_create(raw).0
    }

    /// Like [`resolve`](Self::resolve), seeding coordinates from the import
    /// record. An existing place only takes the new coordinates under the
    /// merge rule of [`GeocodeRecord::merge_from_source`].
    pub fn resolve_with_coordinates(
        &mut self,
        raw: &str,
        latitude: &str,
        longitude: &str,
        status: GeocodeStatus,
    ) -> PlaceId {
        let (id, created) = self.get_or_create(raw);
        if id.is_sentinel() {
            return id;
        }
        let incoming = GeocodeRecord::from_source(Coordinates::parse(latitude, longitude), status);
        let include_partials = self.settings.include_partials;
        if let Some(record) = self.geocode_mut(id) {
            if created {
                *record = incoming;
            } else if record.merge_from_source(&incoming, include_partials) {
                debug!(%id, "Merged source coordinates into {}", raw.trim());
            }
        }
        id
    }

    fn get_or_create(&mut self, raw: &str) -> (PlaceId, bool) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return (PlaceId::BLANK, false);
        }
        if trimmed.eq_ignore_ascii_case(UNKNOWN_COUNTRY) {
            return (PlaceId::UNKNOWN, false);
        }
        if let Some(index) = self.lookup_key(trimmed) {
            let id = self.id_for(index);
            self.mark_sourced(index, trimmed);
            return (id, false);
        }

        let candidate = self.pipeline().build(trimmed);
        if candidate.hierarchy.is_empty() {
            return (PlaceId::BLANK, false);
        }
        if let Some(&index) = self.canonical.get(candidate.canonical()) {
            self.aliases.insert(trimmed.to_string(), index);
            self.mark_sourced(index, trimmed);
            return (self.id_for(index), false);
        }

        let ancestors: Vec<Hierarchy> = Level::all()
            .iter()
            .filter(|level| **level < candidate.level)
            .map(|level| truncate(&candidate.hierarchy, *level))
            .collect();

        let mut place = candidate;
        place.synthetic = false;
        place.original_text = trimmed.to_string();
        let index = self.insert(place);
        self.aliases.insert(trimmed.to_string(), index);

        for (level, hierarchy) in Level::all().iter().zip(ancestors) {
            self.intern_ancestor(hierarchy, *level);
        }
        (self.id_for(index), true)
    }

    fn lookup_key(&self, text: &str) -> Option<u32> {
        self.canonical
            .get(text)
            .or_else(|| self.aliases.get(text))
            .copied()
    }

    /// Intern an ancestor without expanding its own ancestors; the caller
    /// walks every level.
    fn intern_ancestor(&mut self, hierarchy: Hierarchy, level: Level) -> u32 {
        if hierarchy.is_empty() {
            return PlaceId::BLANK.index;
        }
        let canonical = hierarchy.render(Level::Place, self.settings.allow_empty_levels);
        if let Some(&index) = self.canonical.get(&canonical) {
            return index;
        }
        self.insert(Place {
            original_text: String::new(),
            hierarchy,
            level,
            synthetic: true,
            allow_empty_levels: self.settings.allow_empty_levels,
            canonical,
        })
    }

    fn insert(&mut self, place: Place) -> u32 {
        let index = self.places.len() as u32;
        debug!(
            index,
            level = %place.level,
            synthetic = place.synthetic,
            "Interned {}",
            place.canonical
        );
        self.canonical.insert(place.canonical.clone(), index);
        self.places.push(place);
        self.geocodes
            .push(GeocodeRecord::new(GeocodeStatus::NotSearched));
        index
    }

    fn mark_sourced(&mut self, index: u32, raw: &str) {
        if index <= PlaceId::BLANK.index {
            return;
        }
        if let Some(place) = self.places.get_mut(index as usize) {
            if place.synthetic {
                place.synthetic = false;
                place.original_text = raw.to_string();
            }
        }
    }

    /// The interned place for `raw` if there is one, otherwise a place built
    /// for the caller alone. The registry is left untouched.
    pub fn lookup_only(&self, raw: &str) -> Cow<'_, Place> {
        let trimmed = raw.trim();
        let sentinel = if trimmed.is_empty() {
            Some(PlaceId::BLANK)
        } else if trimmed.eq_ignore_ascii_case(UNKNOWN_COUNTRY) {
            Some(PlaceId::UNKNOWN)
        } else {
            None
        };
        if let Some(place) = sentinel.and_then(|id| self.place(id)) {
            return Cow::Borrowed(place);
        }
        if let Some(index) = self.lookup_key(trimmed) {
            return Cow::Borrowed(&self.places[index as usize]);
        }
        let candidate = self.pipeline().build(trimmed);
        match self.canonical.get(candidate.canonical()) {
            Some(&index) => Cow::Borrowed(&self.places[index as usize]),
            None => Cow::Owned(candidate),
        }
    }

    /// The interned ancestor of `id` truncated to `level`, or `id` itself when
    /// `level` is at or below the place's own level.
    pub fn at_level(&mut self, id: PlaceId, level: Level) -> Option<PlaceId> {
        let place = self.place(id)?;
        if id.is_sentinel() || level >= place.level || level == Level::Unknown {
            return Some(id);
        }
        let hierarchy = truncate(&place.hierarchy, level);
        let index = self.intern_ancestor(hierarchy, level);
        Some(self.id_for(index))
    }

    fn id_for(&self, index: u32) -> PlaceId {
        match index {
            0 => PlaceId::UNKNOWN,
            1 => PlaceId::BLANK,
            _ => PlaceId {
                index,
                epoch: self.epoch,
            },
        }
    }

    fn slot(&self, id: PlaceId) -> Option<usize> {
        let live = if id.is_sentinel() {
            true
        } else {
            id.epoch == self.epoch && id.index > PlaceId::BLANK.index
        };
        let index = id.index as usize;
        (live && index < self.places.len()).then_some(index)
    }

    pub fn place(&self, id: PlaceId) -> Option<&Place> {
        self.slot(id).map(|i| &self.places[i])
    }

    pub fn geocode(&self, id: PlaceId) -> Option<&GeocodeRecord> {
        self.slot(id).map(|i| &self.geocodes[i])
    }

    pub fn geocode_mut(&mut self, id: PlaceId) -> Option<&mut GeocodeRecord> {
        self.slot(id).map(|i| &mut self.geocodes[i])
    }

    /// Whether the geocode for `id` can be trusted under this session's
    /// partial-match setting
    pub fn is_geocoded(&self, id: PlaceId, recheck_partials: bool) -> bool {
        self.geocode(id).map_or(false, |record| {
            record.is_geocoded(recheck_partials, self.settings.include_partials)
        })
    }

    /// Live and not a sentinel
    pub fn is_known(&self, id: PlaceId) -> bool {
        !id.is_sentinel() && self.slot(id).is_some()
    }

    /// Copy the whole geocode record of `from` onto `to`.
    pub fn copy_geocode(&mut self, from: PlaceId, to: PlaceId) -> bool {
        let Some(record) = self.geocode(from).cloned() else {
            return false;
        };
        match self.geocode_mut(to) {
            Some(target) => {
                *target = record;
                true
            }
            None => false,
        }
    }

    /// Text to send to an external geocoder for `id`.
    ///
    /// Multi-level substitutions are tried on the full rendering first. If
    /// none applies, country, region and sub-region are replaced one by one
    /// and the hierarchy is rendered again.
    pub fn geocoder_text(&self, id: PlaceId) -> Option<String> {
        let place = self.place(id)?;
        let fixes = LayeredFixes {
            user: self.user_fixes.as_ref(),
            bundled: self.rules.as_ref().map(RuleTables::geocoder_fixes),
        };
        let rendered = place.render(Level::Place);
        if let Some(fixed) = fixes.replace_multi(&rendered) {
            return Some(fixed);
        }

        let mut hierarchy = place.hierarchy.clone();
        let levels = [
            (Level::Country, FixLevel::Country),
            (Level::Region, FixLevel::Region),
            (Level::SubRegion, FixLevel::SubRegion),
        ];
        for (level, fix_level) in levels {
            if let Some(fixed) = fixes.level_fix(fix_level, hierarchy.get(level)) {
                let fixed = fixed.to_string();
                if let Some(i) = level.index() {
                    *hierarchy.fields_mut()[i] = fixed;
                }
            }
        }
        Some(hierarchy.render(Level::Place, place.allow_empty_levels))
    }

    /// Live places with their ids, sentinels first
    pub fn places(&self) -> impl Iterator<Item = (PlaceId, &Place)> + '_ {
        self.places
            .iter()
            .enumerate()
            .map(move |(i, place)| (self.id_for(i as u32), place))
    }

    /// Interned places, sentinels included
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Nothing interned beyond the sentinels
    pub fn is_empty(&self) -> bool {
        self.places.len() <= 2
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for (i, (place, record)) in self.places.iter().zip(&self.geocodes).enumerate() {
            if i == PlaceId::UNKNOWN.index as usize || i == PlaceId::BLANK.index as usize {
                continue;
            }
            stats.locations += 1;
            if record.is_geocoded(false, self.settings.include_partials) {
                stats.geocoded += 1;
            }
            if !place.synthetic {
                stats.sourced += 1;
                if !record.coordinates.is_zero() {
                    stats.sourced_with_coordinates += 1;
                }
            }
        }
        stats
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Tables in use, `None` in pass-through mode
    pub fn rules(&self) -> Option<&RuleTables> {
        self.rules.as_ref()
    }

    pub fn session_started(&self) -> DateTime<Utc> {
        self.session_started
    }
}

/// Copy of `hierarchy` with every field deeper than `level` cleared
fn truncate(hierarchy: &Hierarchy, level: Level) -> Hierarchy {
    let mut truncated = hierarchy.clone();
    let keep = level.index().map_or(0, |i| i + 1);
    for field in truncated.fields_mut().into_iter().skip(keep) {
        field.clear();
    }
    truncated
}

fn load_rules(settings: &Settings) -> Option<RuleTables> {
    if settings.skip_fixing {
        return None;
    }
    match &settings.rules {
        Some(path) => RuleTables::load_or_warn(path),
        None => {
            info!("No rule tables configured; location fixes disabled");
            None
        }
    }
}

fn load_user_fixes(settings: &Settings) -> Option<GeocoderFixes> {
    let path = settings.user_geocoder_fixes.as_ref()?;
    GeocoderFixes::load_or_warn(path)
}
