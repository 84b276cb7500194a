use std::cmp::Ordering;
use std::fs;

use locus::normalize::Pipeline;
use locus::{compare, Coordinates, GeocodeStatus, Level, PlaceId, Registry, RuleTables, Settings};

const RULES: &str = r#"
[[country_typos]]
from = "Englnd"
to = "England"

[[country_typos]]
from = "Frnace"
to = "France"

[[region_typos]]
from = "Frnace"
to = "France"

[[chapman_codes]]
code = "ESS"
county = "Essex"

[[country_shifts]]
region = "Essex"
country = "England"

[[city_add_country]]
city = "London"
country = "England"

[[region_shifts]]
parish = "Bow"
region = "London"
"#;

fn registry() -> Registry {
    let rules = RuleTables::from_toml_str(RULES).unwrap();
    Registry::with_rules(Settings::default(), Some(rules))
}

#[test]
fn value_equal_inputs_share_identity() {
    let mut registry = registry();
    let a = registry.resolve("Springfield, Essex, Englnd");
    let b = registry.resolve("  springfield ,essex,England");
    let c = registry.resolve("Springfield, ESS, England");
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_ne!(a, registry.resolve("Chelmsford, Essex, England"));
}

#[test]
fn ancestors_are_complete() {
    let mut registry = registry();
    let id = registry.resolve("1 Main St, Springfield, Essex, England");
    let place = registry.place(id).unwrap().clone();
    assert_eq!(place.level(), Level::Address);
    let before = registry.len();

    for level in [Level::Country, Level::Region, Level::SubRegion] {
        let ancestor_id = registry.at_level(id, level).unwrap();
        let ancestor = registry.place(ancestor_id).unwrap();
        assert_eq!(ancestor.level(), level);
        assert_eq!(ancestor.canonical(), place.render(level));
        assert!(ancestor.is_synthetic());
        assert!(compare::equals(ancestor, &place, level));
    }
    assert_eq!(registry.len(), before);
}

#[test]
fn ordering_examples() {
    let mut registry = registry();
    let a = registry.resolve("1 Main St, Springfield, Essex, England");
    let b = registry.resolve("2 Main St, Springfield, Essex, England");
    let c = registry.resolve("Springfield, Essex, England");
    let d = registry.resolve("12 Main St, Springfield, Essex, England");
    let (a, b, c, d) = (
        registry.place(a).unwrap(),
        registry.place(b).unwrap(),
        registry.place(c).unwrap(),
        registry.place(d).unwrap(),
    );

    assert_eq!(compare::compare(c, a, Level::Place), Ordering::Less);
    assert_eq!(compare::compare(a, b, Level::Place), Ordering::Less);
    assert_eq!(compare::compare(b, d, Level::Place), Ordering::Less);
    assert_eq!(compare::compare(a, c, Level::SubRegion), Ordering::Equal);
}

#[test]
fn merge_rule() {
    let mut registry = registry();
    let id = registry.resolve_with_coordinates("Springfield, Essex", "", "", GeocodeStatus::NoMatch);
    registry.resolve_with_coordinates("Springfield, Essex", "N51.7", "E0.47", GeocodeStatus::Matched);
    let record = registry.geocode(id).unwrap();
    assert_eq!(record.status, GeocodeStatus::GedcomUser);
    assert_eq!(record.coordinates.latitude, 51.7);
    assert_eq!(record.coordinates.longitude, 0.47);
    assert!(record.found_location.is_empty());

    let id = registry.resolve_with_coordinates("Chelmsford, Essex", "1", "1", GeocodeStatus::Matched);
    let kept = registry.resolve_with_coordinates("Chelmsford, Essex", "1", "1", GeocodeStatus::PartialMatch);
    assert_eq!(id, kept);
    let record = registry.geocode(id).unwrap();
    assert_eq!(record.status, GeocodeStatus::Matched);
    assert_eq!(record.coordinates.latitude, 1.0);
}

#[test]
fn uk_gb_expansion() {
    let mut registry = registry();
    let id = registry.resolve("High St, London, Scotland, UK");
    let place = registry.place(id).unwrap();
    assert_eq!(place.country(), "Scotland");
    assert_eq!(place.region(), "London");
    assert_eq!(place.sub_region(), "High St");
    assert_eq!(place.address(), "");
    assert_eq!(place.canonical(), "High St, London, Scotland");
}

#[test]
fn double_collapse() {
    let mut registry = registry();
    let id = registry.resolve("Paris, Frnace, France");
    let place = registry.place(id).unwrap();
    assert_eq!(place.canonical(), "Paris, France");
    assert_eq!(place.region(), "Paris");
    assert_eq!(place.sub_region(), "");
}

#[test]
fn sentinels_are_fixed() {
    let mut registry = registry();
    assert_eq!(registry.resolve(""), PlaceId::BLANK);
    assert_eq!(registry.resolve("   "), PlaceId::BLANK);
    assert_eq!(registry.resolve("Unknown"), PlaceId::UNKNOWN);
    assert_eq!(registry.resolve("uNkNoWn"), PlaceId::UNKNOWN);
    registry.reset();
    assert_eq!(registry.resolve("UNKNOWN"), PlaceId::UNKNOWN);
    assert!(registry.place(PlaceId::BLANK).is_some());
}

#[test]
fn corrections_are_idempotent() {
    let settings = Settings::default();
    let rules = RuleTables::from_toml_str(RULES).unwrap();
    let pipeline = Pipeline::new(&settings, Some(&rules));
    let mut registry = Registry::with_rules(settings.clone(), Some(rules.clone()));

    let inputs = [
        "1 Main St, Springfield, Essex, England",
        "High St, London, Scotland, UK",
        "Paris, Frnace, France",
        "Mile End, Bow, England",
        "Rose Cottage, 2 Mill Lane, Springfield, ESS",
        "  , , London",
        "Zürich, Schweiz",
        "Springfield, ., England",
        "Springfield, Essex, .",
    ];
    for input in inputs {
        let id = registry.resolve(input);
        let place = registry.place(id).unwrap().clone();

        let mut hierarchy = place.hierarchy().clone();
        let mut level = place.level();
        pipeline.correct(&mut hierarchy, &mut level);
        assert_eq!(&hierarchy, place.hierarchy(), "input {:?}", input);

        assert_eq!(registry.resolve(place.canonical()), id, "input {:?}", input);
    }
}

#[test]
fn rules_loaded_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.toml");
    fs::write(&path, RULES).unwrap();

    let settings = Settings {
        rules: Some(path),
        ..Settings::default()
    };
    let mut registry = Registry::new(settings);
    assert!(registry.rules().is_some());
    let id = registry.resolve("Bow, England");
    assert_eq!(registry.place(id).unwrap().canonical(), "Bow, London, England");

    let settings = Settings {
        rules: Some(dir.path().join("missing.toml")),
        ..Settings::default()
    };
    let mut registry = Registry::new(settings);
    assert!(registry.rules().is_none());
    let id = registry.resolve("Bow, Englnd");
    assert_eq!(registry.place(id).unwrap().canonical(), "Bow, Englnd");
}

#[test]
fn punctuation_gaps_are_closed() {
    let mut registry = registry();
    let id = registry.resolve("Springfield, Essex, .");
    let place = registry.place(id).unwrap();
    assert_eq!(place.country(), "England");
    assert_eq!(place.canonical(), "Springfield, Essex, England");

    let id = registry.resolve("Springfield, ., England");
    assert_eq!(registry.place(id).unwrap().canonical(), "Springfield, England");

    assert_eq!(registry.resolve("., ."), PlaceId::BLANK);
}

#[test]
fn reset_reloads_rules_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.toml");
    fs::write(&path, RULES).unwrap();

    let settings = Settings {
        rules: Some(path.clone()),
        ..Settings::default()
    };
    let mut registry = Registry::new(settings);
    let before = registry.resolve("Bow, England");
    assert_eq!(registry.place(before).unwrap().canonical(), "Bow, London, England");

    fs::write(
        &path,
        r#"
[[region_shifts]]
parish = "Bow"
region = "Tower Hamlets"
"#,
    )
    .unwrap();
    registry.reset();

    assert!(registry.place(before).is_none());
    let after = registry.resolve("Bow, England");
    assert_eq!(
        registry.place(after).unwrap().canonical(),
        "Bow, Tower Hamlets, England"
    );
    assert_eq!(registry.rules().unwrap().country_typo("Englnd"), None);
    let id = registry.resolve("Bow, Englnd");
    assert_eq!(registry.place(id).unwrap().canonical(), "Bow, Englnd");
}

#[test]
fn merge_keeps_enriched_geocode() {
    let mut registry = registry();
    let id = registry.resolve("Springfield, Essex, England");
    {
        let record = registry.geocode_mut(id).unwrap();
        record.apply_enrichment(
            GeocodeStatus::Matched,
            Coordinates::new(1.0, 1.0),
            Coordinates::new(111_000.0, 111_000.0),
        );
        record.set_reverse_geocode("Springfield, Essex", "locality", Some(Level::SubRegion));
    }

    let again = registry.resolve_with_coordinates(
        "Springfield, Essex, England",
        "1",
        "1",
        GeocodeStatus::PartialMatch,
    );
    assert_eq!(again, id);
    let record = registry.geocode(id).unwrap();
    assert_eq!(record.status, GeocodeStatus::Matched);
    assert_eq!(record.projected, Coordinates::new(111_000.0, 111_000.0));
    assert_eq!(record.found_location, "Springfield, Essex");
    assert!(!record.needs_reverse_geocoding());

    // moved coordinates overwrite, keeping the projection until re-enriched
    registry.resolve_with_coordinates("Springfield, Essex, England", "2", "2", GeocodeStatus::Matched);
    let record = registry.geocode(id).unwrap();
    assert_eq!(record.status, GeocodeStatus::GedcomUser);
    assert_eq!(record.coordinates, Coordinates::new(2.0, 2.0));
    assert_eq!(record.projected, Coordinates::new(111_000.0, 111_000.0));
    assert!(record.needs_reverse_geocoding());
}
