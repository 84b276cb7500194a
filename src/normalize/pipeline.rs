//! Ordered correction stages applied once when a place is constructed.
//!
//! Stage order:
//! 1. hoist values over empty levels
//! 2. diacritic removal
//! 3. punctuation (full stops, repeated spaces, `&`, stray commas)
//! 4. "UK"/"GB" followed by a constituent country
//! 5. country typos
//! 6. country demoted to region
//! 7. region typos
//! 8. region demoted to sub-region (United Kingdom only)
//! 9. collapse repeated levels
//! 10. capitalisation
//!
//! Without rule tables the typo, shift and capitalisation stages are skipped.
//! Stages 4 to 10 run as a pass that repeats until nothing changes. Each pass
//! hoists again first, so a field emptied by punctuation or diacritic removal
//! never leaves a gap behind.

use tracing::trace;

use super::countries;
use super::parser::{parse, ParsedPlace};
use super::text::{capitalize_first, collapse_spaces, remove_diacritics};
use crate::config::Settings;
use crate::models::{Hierarchy, Level, Place};
use crate::rules::RuleTables;

/// Region abbreviation that means Western Australia rather than Washington
const WESTERN_AUSTRALIA_ABBR: &str = "WA";
const WESTERN_AUSTRALIA: &str = "Western Australia";

/// Upper bound on correction passes; shift tables that map back onto
/// themselves stop here
const MAX_PASSES: usize = 4;

/// Correction pipeline bound to one session's settings and tables.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'a> {
    settings: &'a Settings,
    rules: Option<&'a RuleTables>,
}

impl<'a> Pipeline<'a> {
    /// `rules` is `None` when no tables could be loaded (pass-through mode).
    pub fn new(settings: &'a Settings, rules: Option<&'a RuleTables>) -> Self {
        Self { settings, rules }
    }

    /// Parse and correct `raw` into a place that is not interned anywhere.
    pub fn build(&self, raw: &str) -> Place {
        let ParsedPlace {
            original_text,
            mut hierarchy,
            mut level,
        } = parse(raw);

        if !self.settings.skip_fixing {
            self.correct(&mut hierarchy, &mut level);
        }

        let canonical = if self.settings.skip_fixing {
            original_text.clone()
        } else {
            hierarchy.render(Level::Place, self.settings.allow_empty_levels)
        };

        Place {
            original_text,
            hierarchy,
            level,
            synthetic: true,
            allow_empty_levels: self.settings.allow_empty_levels,
            canonical,
        }
    }

    /// Run every stage over `hierarchy`. Demotions deepen `level`.
    ///
    /// Stages 4 to 10 repeat until a pass changes nothing, so a value exposed
    /// by a collapse or a capitalisation still gets its typo and shift fixes
    /// and running the pipeline again on the result is a no-op.
    pub fn correct(&self, hierarchy: &mut Hierarchy, level: &mut Level) {
        let hoist = !self.settings.allow_empty_levels;
        if hoist {
            hoist_empty_levels(hierarchy);
        }
        remove_all_diacritics(hierarchy);
        fix_punctuation(hierarchy);

        for _ in 0..MAX_PASSES {
            let before = hierarchy.clone();
            if hoist {
                hoist_empty_levels(hierarchy);
            }
            expand_uk_gb(hierarchy);

            if let Some(rules) = self.rules {
                fix_country_typos(hierarchy, rules);
                if shift_country_to_region(hierarchy, rules) {
                    deepen(level);
                }
                fix_region_typos(hierarchy, rules);
                if shift_region_to_sub_region(hierarchy, rules) {
                    deepen(level);
                }
            }

            collapse_double_levels(hierarchy);

            if self.rules.is_some() {
                fix_capitalisation(hierarchy);
            }
            if *hierarchy == before {
                break;
            }
        }
        trace!(?hierarchy, %level, "corrected");
    }
}

fn deepen(level: &mut Level) {
    *level = level.deeper();
}

/// Close gaps so every populated field sits as high as it can.
fn hoist_empty_levels(h: &mut Hierarchy) {
    for level in &Level::all()[..4] {
        let Some(idx) = level.index() else {
            continue;
        };
        for _ in idx..4 {
            let fields = h.fields();
            if !fields[idx].is_empty() || fields[idx + 1..].iter().all(|f| f.is_empty()) {
                break;
            }
            h.shift_up_from(*level);
        }
    }
}

fn remove_all_diacritics(h: &mut Hierarchy) {
    for field in h.fields_mut() {
        *field = remove_diacritics(field);
    }
}

fn fix_punctuation(h: &mut Hierarchy) {
    h.region = h.region.replace('.', " ");
    h.country = h.country.replace('.', " ");
    for field in h.fields_mut() {
        let fixed = field.replace('&', "and").replace(',', "");
        *field = collapse_spaces(&fixed);
    }
}

fn expand_uk_gb(h: &mut Hierarchy) {
    if countries::is_uk_abbreviation(&h.country) && countries::is_uk_expansion(&h.region) {
        h.shift_up_from(Level::Country);
    }
}

fn fix_country_typos(h: &mut Hierarchy, rules: &RuleTables) {
    if let Some(fixed) = rules.country_typo(&h.country) {
        h.country = fixed.to_string();
    }
}

fn shift_country_to_region(h: &mut Hierarchy, rules: &RuleTables) -> bool {
    match rules.country_shift(&h.country) {
        Some(country) => {
            let country = country.to_string();
            h.push_down(&country);
            true
        }
        None => false,
    }
}

fn fix_region_typos(h: &mut Hierarchy, rules: &RuleTables) {
    if h.country == countries::AUSTRALIA && h.region == WESTERN_AUSTRALIA_ABBR {
        h.region = WESTERN_AUSTRALIA.to_string();
        return;
    }
    if let Some(fixed) = rules.region_typo(&h.region) {
        h.region = fixed.to_string();
    }
}

fn shift_region_to_sub_region(h: &mut Hierarchy, rules: &RuleTables) -> bool {
    if !countries::is_united_kingdom(&h.country) {
        return false;
    }
    match rules.region_shift(&h.region) {
        Some(region) => {
            let region = region.to_string();
            h.push_down_region(&region);
            true
        }
        None => false,
    }
}

/// Remove a level that repeats the one above it.
fn collapse_double_levels(h: &mut Hierarchy) {
    for _ in 0..4 {
        if !h.country.is_empty() && h.country == h.region {
            h.shift_up_from(Level::Region);
        } else if !h.region.is_empty() && h.region == h.sub_region {
            h.shift_up_from(Level::SubRegion);
        } else {
            break;
        }
    }
}

fn fix_capitalisation(h: &mut Hierarchy) {
    for field in h.fields_mut() {
        if !field.is_empty() {
            *field = capitalize_first(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleTables {
        let mut builder = RuleTables::builder();
        builder
            .country_typo("Englnd", "England")
            .country_typo("Frnace", "France")
            .region_typo("Lancs", "Lancashire")
            .region_typo("Frnace", "France")
            .region_typo("WA", "Washington")
            .country_shift("Essex", "England")
            .country_shift("California", "United States")
            .region_shift("Bow", "London");
        builder.build()
    }

    fn build(raw: &str) -> Place {
        let settings = Settings::default();
        let rules = rules();
        Pipeline::new(&settings, Some(&rules)).build(raw)
    }

    #[test]
    fn test_hoist_closes_gaps() {
        let place = build("Springfield, , Kent,");
        assert_eq!(place.country(), "Kent");
        assert_eq!(place.region(), "Springfield");
        assert_eq!(place.sub_region(), "");
        // level stays as parsed
        assert_eq!(place.level(), Level::Address);
    }

    #[test]
    fn test_hoist_after_punctuation() {
        let place = build("Springfield, ., England");
        assert_eq!(place.country(), "England");
        assert_eq!(place.region(), "Springfield");
        assert_eq!(place.sub_region(), "");
        assert_eq!(place.canonical(), "Springfield, England");

        let settings = Settings::default();
        let place = Pipeline::new(&settings, None).build("Springfield, Essex, .");
        assert_eq!(place.country(), "Essex");
        assert_eq!(place.region(), "Springfield");
        assert_eq!(place.canonical(), "Springfield, Essex");

        // with rules the hoisted county is then demoted under its country
        let place = build("Springfield, Essex, .");
        assert_eq!(place.canonical(), "Springfield, Essex, England");
    }

    #[test]
    fn test_punctuation_only_is_empty() {
        let place = build("., .");
        assert!(place.hierarchy().is_empty());
    }

    #[test]
    fn test_allow_empty_keeps_gaps() {
        let settings = Settings {
            allow_empty_levels: true,
            ..Settings::default()
        };
        let place = Pipeline::new(&settings, None).build("Springfield, , England");
        assert_eq!(place.country(), "England");
        assert_eq!(place.region(), "");
        assert_eq!(place.sub_region(), "Springfield");
        assert_eq!(place.canonical(), "Springfield, , England");
    }

    #[test]
    fn test_diacritics_and_punctuation() {
        let place = build("Rue  de l'Église, St. Étienne, Loire & Haute-Loire, Frnace");
        assert_eq!(place.country(), "France");
        assert_eq!(place.region(), "Loire and Haute-Loire");
        assert_eq!(place.sub_region(), "St. Etienne");
        assert_eq!(place.address(), "Rue de l'Eglise");
    }

    #[test]
    fn test_region_full_stops_removed() {
        let place = build("Boston, Mass., U.S.A.");
        assert_eq!(place.country(), "U S A");
        assert_eq!(place.region(), "Mass");
    }

    #[test]
    fn test_uk_gb_expansion() {
        let place = build("High St, London, Scotland, UK");
        assert_eq!(place.country(), "Scotland");
        assert_eq!(place.region(), "London");
        assert_eq!(place.sub_region(), "High St");
        assert_eq!(place.address(), "");
    }

    #[test]
    fn test_country_typo_title_case_fallback() {
        let place = build("Springfield, Essex, ENGLND");
        // matched through the title-case fallback, "Englnd" is title case
        assert_eq!(place.country(), "England");
    }

    #[test]
    fn test_country_demoted_to_region() {
        let place = build("Main St, Springfield, Essex");
        assert_eq!(place.country(), "England");
        assert_eq!(place.region(), "Essex");
        assert_eq!(place.sub_region(), "Springfield");
        assert_eq!(place.address(), "Main St");
        assert_eq!(place.level(), Level::Address);
    }

    #[test]
    fn test_western_australia_exception() {
        let place = build("Perth, WA, Australia");
        assert_eq!(place.region(), "Western Australia");
        let place = build("Seattle, WA, USA");
        assert_eq!(place.region(), "Washington");
    }

    #[test]
    fn test_region_shift_uk_only() {
        let place = build("Bow, England");
        assert_eq!(place.region(), "London");
        assert_eq!(place.sub_region(), "Bow");
        assert_eq!(place.level(), Level::SubRegion);

        let place = build("Bow, France");
        assert_eq!(place.region(), "Bow");
    }

    #[test]
    fn test_double_collapse() {
        let place = build("Paris, Frnace, France");
        assert_eq!(place.country(), "France");
        assert_eq!(place.region(), "Paris");
        assert_eq!(place.sub_region(), "");
        assert_eq!(place.canonical(), "Paris, France");
    }

    #[test]
    fn test_capitalisation() {
        let place = build("springfield, essex, england");
        assert_eq!(place.canonical(), "Springfield, Essex, England");
    }

    #[test]
    fn test_pass_through_without_rules() {
        let settings = Settings::default();
        let place = Pipeline::new(&settings, None).build("springfield, essex, englnd & co");
        assert_eq!(place.country(), "englnd and co");
        assert_eq!(place.region(), "essex");
    }

    #[test]
    fn test_skip_fixing_uses_original_text() {
        let settings = Settings {
            skip_fixing: true,
            ..Settings::default()
        };
        let rules = rules();
        let place = Pipeline::new(&settings, Some(&rules)).build(" Springfield, ,Englnd ");
        assert_eq!(place.canonical(), "Springfield, ,Englnd");
        assert_eq!(place.country(), "Englnd");
        assert_eq!(place.region(), "");
    }

    #[test]
    fn test_correction_is_idempotent() {
        let settings = Settings::default();
        let rules = rules();
        let pipeline = Pipeline::new(&settings, Some(&rules));
        let inputs = [
            "High St, London, Scotland, UK",
            "Paris, Frnace, France, France",
            "Main St, Springfield, Essex",
            "Flat 2, Rose Cottage,1 Main St, Bow, england",
            "  ,, lancs ,Englnd",
            "Perth, WA, Australia",
            "Zürich & Umgebung, Schweiz",
            "Springfield, ., England",
            "Springfield, Essex, .",
        ];
        for input in inputs {
            let once = pipeline.build(input);
            let mut hierarchy = once.hierarchy().clone();
            let mut level = once.level();
            pipeline.correct(&mut hierarchy, &mut level);
            assert_eq!(&hierarchy, once.hierarchy(), "input {:?}", input);
        }
    }
}
