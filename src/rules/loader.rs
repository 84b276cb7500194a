//! Rule files on disk.
//!
//! A rule source is either a single TOML file or a directory walked for
//! `*.toml` files. Every file feeds the same builder, so duplicates across
//! files are reported exactly like duplicates within one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::geocoder::{FixLevel, GeocoderFixes};
use super::tables::{RuleTables, RuleTablesBuilder};

#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("failed to read rule file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rule file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to walk rule directory")]
    Walk(#[from] walkdir::Error),
    #[error("rule source not found: {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Deserialize)]
struct Mapping {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct ChapmanCode {
    code: String,
    county: String,
}

#[derive(Debug, Deserialize)]
struct CountryToRegion {
    region: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct CityAddCountry {
    city: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct RegionToParish {
    parish: String,
    region: String,
}

#[derive(Debug, Deserialize)]
struct FreeCenLookup {
    code: String,
    county: String,
}

#[derive(Debug, Deserialize)]
struct FindMyPastLookup {
    code: String,
    county: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct GeocoderFix {
    level: FixLevel,
    from: String,
    #[serde(default)]
    to: String,
}

/// One rule file as written on disk
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuleFile {
    country_typos: Vec<Mapping>,
    region_typos: Vec<Mapping>,
    chapman_codes: Vec<ChapmanCode>,
    country_shifts: Vec<CountryToRegion>,
    city_add_country: Vec<CityAddCountry>,
    region_shifts: Vec<RegionToParish>,
    freecen: Vec<FreeCenLookup>,
    findmypast: Vec<FindMyPastLookup>,
    geocoder_fixes: Vec<GeocoderFix>,
}

impl RuleFile {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Feed every row into `builder`, in table order.
    pub fn apply(&self, builder: &mut RuleTablesBuilder) {
        for m in &self.country_typos {
            builder.country_typo(&m.from, &m.to);
        }
        for m in &self.region_typos {
            builder.region_typo(&m.from, &m.to);
        }
        for c in &self.chapman_codes {
            builder.chapman_code(&c.code, &c.county);
        }
        for s in &self.country_shifts {
            builder.country_shift(&s.region, &s.country);
        }
        for c in &self.city_add_country {
            builder.city_add_country(&c.city, &c.country);
        }
        for s in &self.region_shifts {
            builder.region_shift(&s.parish, &s.region);
        }
        for l in &self.freecen {
            builder.freecen(&l.county, &l.code);
        }
        for l in &self.findmypast {
            builder.findmypast(&l.county, &l.country, &l.code);
        }
        for f in &self.geocoder_fixes {
            builder.geocoder_fix(f.level, &f.from, &f.to);
        }
    }

    /// Feed only the geocoder fix rows into `fixes`.
    pub fn apply_geocoder_fixes(&self, fixes: &mut GeocoderFixes) {
        for f in &self.geocoder_fixes {
            fixes.insert(f.level, &f.from, &f.to);
        }
    }
}

impl RuleTables {
    /// Build tables from TOML text already in memory.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let file = RuleFile::from_toml_str(content)?;
        let mut builder = RuleTables::builder();
        file.apply(&mut builder);
        Ok(builder.build())
    }

    /// Load a rule file, or every `*.toml` file under a directory.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleLoadError> {
        let mut builder = RuleTables::builder();
        for_each_file(path.as_ref(), |file| file.apply(&mut builder))?;
        Ok(builder.build())
    }

    /// Load rules, reporting any failure as a warning.
    ///
    /// `None` means the pipeline runs in pass-through mode for this session.
    pub fn load_or_warn<P: AsRef<Path>>(path: P) -> Option<Self> {
        match Self::load_from_path(path) {
            Ok(tables) => Some(tables),
            Err(e) => {
                warn!("{:#}; location fixes disabled for this session", anyhow::Error::new(e));
                None
            }
        }
    }
}

impl GeocoderFixes {
    /// Load only the geocoder fixes of a rule file or directory.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleLoadError> {
        let mut fixes = GeocoderFixes::new();
        for_each_file(path.as_ref(), |file| file.apply_geocoder_fixes(&mut fixes))?;
        Ok(fixes)
    }

    /// User fix layer; a failure leaves the bundled fixes in charge.
    pub fn load_or_warn<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        match Self::load_from_path(path) {
            Ok(fixes) => {
                info!("{} user geocoder fixes from {}", fixes.len(), path.display());
                Some(fixes)
            }
            Err(e) => {
                warn!("{:#}; user geocoder fixes ignored", anyhow::Error::new(e));
                None
            }
        }
    }
}

/// Parse `path`, or every `*.toml` under it in file-name order.
fn for_each_file(path: &Path, mut apply: impl FnMut(RuleFile)) -> Result<(), RuleLoadError> {
    if !path.exists() {
        return Err(RuleLoadError::NotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        info!("Loading rule files from {}", path.display());
        for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            let file = entry.path();
            if !file.is_file() || file.extension().map_or(true, |e| e != "toml") {
                continue;
            }
            apply(read_file(file)?);
        }
    } else {
        info!("Loading rule file {}", path.display());
        apply(read_file(path)?);
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<RuleFile, RuleLoadError> {
    let content = fs::read_to_string(path).map_err(|source| RuleLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    RuleFile::from_toml_str(&content).map_err(|source| RuleLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RULES: &str = r#"
[[country_typos]]
from = "Englnd"
to = "England"

[[region_typos]]
from = "Lancs"
to = "Lancashire"

[[chapman_codes]]
code = "ESS"
county = "Essex"

[[country_shifts]]
region = "Essex"
country = "England"

[[region_shifts]]
parish = "Bow"
region = "London"

[[freecen]]
code = "ESS"
county = "Essex"

[[geocoder_fixes]]
level = "country"
from = "Eire"
to = "Ireland"
"#;

    #[test]
    fn test_from_toml_str() {
        let tables = RuleTables::from_toml_str(RULES).unwrap();
        assert_eq!(tables.country_typo("Englnd"), Some("England"));
        assert_eq!(tables.region_typo("Lancs"), Some("Lancashire"));
        assert_eq!(tables.region_typo("ESS"), Some("Essex"));
        assert_eq!(tables.country_shift("Essex"), Some("England"));
        assert_eq!(tables.region_shift("Bow"), Some("London"));
        assert_eq!(tables.freecen_code("Essex"), "ESS");
        assert_eq!(
            tables.geocoder_fixes().level_fix(FixLevel::Country, "eire"),
            Some("Ireland")
        );
    }

    #[test]
    fn test_load_directory_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = fs::File::create(dir.path().join("a.toml")).unwrap();
        writeln!(a, "[[country_typos]]\nfrom = \"Englnd\"\nto = \"England\"").unwrap();
        let mut b = fs::File::create(dir.path().join("b.toml")).unwrap();
        writeln!(
            b,
            "[[country_typos]]\nfrom = \"Englnd\"\nto = \"Wales\"\n\n[[region_typos]]\nfrom = \"Yorks\"\nto = \"Yorkshire\""
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not rules").unwrap();

        let tables = RuleTables::load_from_path(dir.path()).unwrap();
        assert_eq!(tables.country_typo("Englnd"), Some("England"));
        assert_eq!(tables.region_typo("Yorks"), Some("Yorkshire"));
    }

    #[test]
    fn test_missing_source_is_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            RuleTables::load_from_path(&missing),
            Err(RuleLoadError::NotFound(_))
        ));
        assert!(RuleTables::load_or_warn(&missing).is_none());
    }

    #[test]
    fn test_malformed_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[[country_typos]]\nfrom = ").unwrap();
        assert!(matches!(
            RuleTables::load_from_path(&path),
            Err(RuleLoadError::Parse { .. })
        ));
        assert!(RuleTables::load_or_warn(&path).is_none());
    }

    #[test]
    fn test_user_geocoder_fixes_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.toml");
        fs::write(&path, RULES).unwrap();

        let fixes = GeocoderFixes::load_from_path(&path).unwrap();
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes.level_fix(FixLevel::Country, "EIRE"), Some("Ireland"));
        assert!(GeocoderFixes::load_or_warn(dir.path().join("missing.toml")).is_none());
    }
}
