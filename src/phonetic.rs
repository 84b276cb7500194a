//! Phonetic fuzzy-match keys.
//!
//! Each level is reduced to its primary Double Metaphone code so two places
//! spelled differently but pronounced alike share a key.

use rphonetic::{DoubleMetaphone, Encoder};
use tracing::warn;
use unicode_normalization::UnicodeNormalization;

use crate::models::Place;

/// Keep ASCII letters and single spaces; the encoder only understands those.
fn normalize_for_phonetic(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.trim().nfd() {
        if ch.is_ascii_alphabetic() {
            out.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() && !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
    }
    let len = out.trim_end().len();
    out.truncate(len);
    out
}

/// Primary Double Metaphone code, empty for text with no letters.
pub fn primary_code(text: &str) -> String {
    let normalized = normalize_for_phonetic(text);
    if normalized.is_empty() {
        return String::new();
    }
    match std::panic::catch_unwind(|| DoubleMetaphone::default().encode(&normalized)) {
        Ok(code) => code,
        Err(_) => {
            warn!("DoubleMetaphone panicked on input: {:?}", text);
            String::new()
        }
    }
}

/// Per-level codes for one place
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PhoneticCodes {
    pub country: String,
    pub region: String,
    pub sub_region: String,
    pub address: String,
}

impl PhoneticCodes {
    /// "address:subRegion:region:country"
    pub fn fuzzy_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.address, self.sub_region, self.region, self.country
        )
    }

    /// Same as [`fuzzy_key`](Self::fuzzy_key) without the sub-region (parish)
    pub fn fuzzy_key_no_sub_region(&self) -> String {
        format!("{}:{}:{}", self.address, self.region, self.country)
    }
}

impl Place {
    /// Phonetic codes for the levels that make up the fuzzy keys,
    /// recomputed on each call. The place name never takes part.
    pub fn phonetic_codes(&self) -> PhoneticCodes {
        PhoneticCodes {
            country: primary_code(self.country()),
            region: primary_code(self.region()),
            sub_region: primary_code(self.sub_region()),
            address: primary_code(self.address()),
        }
    }

    pub fn fuzzy_key(&self) -> String {
        self.phonetic_codes().fuzzy_key()
    }

    pub fn fuzzy_key_no_sub_region(&self) -> String {
        self.phonetic_codes().fuzzy_key_no_sub_region()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::normalize::Pipeline;

    fn place(raw: &str) -> Place {
        let settings = Settings::default();
        Pipeline::new(&settings, None).build(raw)
    }

    #[test]
    fn test_empty_text_has_empty_code() {
        assert_eq!(primary_code(""), "");
        assert_eq!(primary_code(" 12 "), "");
    }

    #[test]
    fn test_spelling_variants_share_code() {
        assert_eq!(primary_code("Smith"), primary_code("Smyth"));
        assert_eq!(primary_code("Zürich"), primary_code("Zurich"));
        assert!(!primary_code("Essex").is_empty());
    }

    #[test]
    fn test_fuzzy_key_shape() {
        let p = place("1 Main St, Springfield, Essex, England");
        let codes = p.phonetic_codes();
        assert_eq!(
            p.fuzzy_key(),
            format!(
                "{}:{}:{}:{}",
                primary_code("1 Main St"),
                primary_code("Springfield"),
                primary_code("Essex"),
                primary_code("England")
            )
        );
        assert_eq!(p.fuzzy_key(), codes.fuzzy_key());
        assert_eq!(p.fuzzy_key_no_sub_region(), codes.fuzzy_key_no_sub_region());
        assert_eq!(p.fuzzy_key().matches(':').count(), 3);
        assert_eq!(p.fuzzy_key_no_sub_region().matches(':').count(), 2);
    }

    #[test]
    fn test_fuzzy_keys_match_variant_spellings() {
        let a = place("Main Street, Smithfield, Essex, England");
        let b = place("Main Street, Smythfield, Essex, England");
        assert_ne!(a, b);
        assert_eq!(a.fuzzy_key(), b.fuzzy_key());
    }

    #[test]
    fn test_place_name_not_in_keys() {
        let a = place("Mill, 1 Main St, Springfield, Essex, England");
        let b = place("Barn, 1 Main St, Springfield, Essex, England");
        assert_eq!(a.fuzzy_key(), b.fuzzy_key());
        assert_eq!(a.fuzzy_key_no_sub_region(), b.fuzzy_key_no_sub_region());
    }

    #[test]
    fn test_country_only_key() {
        let p = place("England");
        assert_eq!(p.fuzzy_key(), format!(":::{}", primary_code("England")));
        assert_eq!(p.fuzzy_key_no_sub_region(), format!("::{}", primary_code("England")));
    }
}
