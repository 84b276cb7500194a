//! Geocoder-specific text substitutions.
//!
//! Some canonical names are spelled in ways an external geocoder resolves
//! badly. These fixes rewrite the text sent to it without touching the place.

use hashbrown::HashMap;
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Level a substitution applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixLevel {
    Country,
    Region,
    #[serde(alias = "subregion")]
    SubRegion,
    /// Multi-level fix, replaced anywhere in the rendered text
    #[serde(alias = "multi_level")]
    Any,
}

#[derive(Debug, Clone)]
struct MultiLevelFix {
    pattern: Regex,
    to: String,
}

/// Substitutions keyed by (level, uppercased source text).
#[derive(Debug, Clone, Default)]
pub struct GeocoderFixes {
    by_level: HashMap<(FixLevel, String), String>,
    multi: Vec<MultiLevelFix>,
}

impl GeocoderFixes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fix. Later fixes for an existing key are ignored.
    pub fn insert(&mut self, level: FixLevel, from: &str, to: &str) -> bool {
        if from.is_empty() {
            return false;
        }
        let key = (level, from.to_uppercase());
        if self.by_level.contains_key(&key) {
            return false;
        }
        if level == FixLevel::Any {
            match RegexBuilder::new(&regex::escape(from))
                .case_insensitive(true)
                .build()
            {
                Ok(pattern) => self.multi.push(MultiLevelFix {
                    pattern,
                    to: to.to_string(),
                }),
                Err(e) => {
                    warn!("Skipping geocoder fix {:?}: {}", from, e);
                    return false;
                }
            }
        }
        self.by_level.insert(key, to.to_string());
        true
    }

    /// Replacement for a single field at `level`
    pub fn level_fix(&self, level: FixLevel, text: &str) -> Option<&str> {
        self.by_level
            .get(&(level, text.to_uppercase()))
            .map(String::as_str)
    }

    /// Apply every multi-level fix, in insertion order, case-insensitively.
    pub fn replace_multi(&self, text: &str) -> String {
        let mut result = text.to_string();
        for fix in &self.multi {
            if fix.pattern.is_match(&result) {
                result = fix
                    .pattern
                    .replace_all(&result, NoExpand(&fix.to))
                    .into_owned();
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.by_level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_level.is_empty()
    }
}

/// User fixes layered over the bundled ones; the user layer is consulted first.
#[derive(Debug, Clone, Copy)]
pub struct LayeredFixes<'a> {
    pub user: Option<&'a GeocoderFixes>,
    pub bundled: Option<&'a GeocoderFixes>,
}

impl<'a> LayeredFixes<'a> {
    fn layers(&self) -> impl Iterator<Item = &'a GeocoderFixes> {
        self.user.into_iter().chain(self.bundled)
    }

    /// Multi-level pass: the first layer that changes the text wins.
    pub fn replace_multi(&self, text: &str) -> Option<String> {
        self.layers()
            .map(|fixes| fixes.replace_multi(text))
            .find(|fixed| fixed != text)
    }

    pub fn level_fix(&self, level: FixLevel, text: &str) -> Option<&'a str> {
        self.layers().find_map(|fixes| fixes.level_fix(level, text))
    }
}
