//! Small text helpers shared by the parser, rule tables and comparator.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static HOUSE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[A-Za-z]?$").expect("valid house number regex"));

/// Strip accents by decomposing and dropping combining marks.
pub fn remove_diacritics(s: &str) -> String {
    if s.is_ascii() {
        return s.to_string();
    }
    s.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Uppercase the first letter of each word, lowercase the rest.
///
/// A word starts after any character that is neither a letter nor an
/// apostrophe, so "st. mary's" becomes "St. Mary's".
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = c != '\'';
        }
    }
    out
}

/// Uppercase only the first character.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collapse runs of whitespace into a single space and trim.
pub fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Address split into its street text and an optional leading house number.
///
/// "12 Main St" orders under "Main St", and "2 Main St" before "12 Main St".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericKey<'a> {
    pub name: &'a str,
    pub number: Option<&'a str>,
}

impl<'a> NumericKey<'a> {
    pub fn new(field: &'a str) -> Self {
        if let Some((number, name)) = field.split_once(' ') {
            if !number.is_empty() && HOUSE_NUMBER.is_match(number) {
                return Self {
                    name,
                    number: Some(number),
                };
            }
        }
        Self {
            name: field,
            number: None,
        }
    }

    /// "Main St - 12" form, the address with its number moved to the end
    pub fn sortable(&self) -> String {
        match self.number {
            Some(number) => format!("{} - {}", self.name, number),
            None => self.name.to_string(),
        }
    }

    /// Street text without the house number
    pub fn without_number(&self) -> &'a str {
        self.name
    }
}

impl Ord for NumericKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(other.name)
            .then_with(|| match (self.number, other.number) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => compare_house_numbers(a, b),
            })
    }
}

impl PartialOrd for NumericKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare "12a" style tokens by numeric value, then suffix, then raw text.
fn compare_house_numbers(a: &str, b: &str) -> Ordering {
    let split = |s: &'_ str| -> (String, String) {
        let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let digits = s[..digits_end].trim_start_matches('0').to_string();
        (digits, s[digits_end..].to_ascii_lowercase())
    };
    let (da, sa) = split(a);
    let (db, sb) = split(b);
    da.len()
        .cmp(&db.len())
        .then_with(|| da.cmp(&db))
        .then_with(|| sa.cmp(&sb))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_diacritics() {
        assert_eq!(remove_diacritics("Zürich"), "Zurich");
        assert_eq!(remove_diacritics("Besançon"), "Besancon");
        assert_eq!(remove_diacritics("plain"), "plain");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("new south wales"), "New South Wales");
        assert_eq!(title_case("st. mary's"), "St. Mary's");
        assert_eq!(title_case("stoke-on-trent"), "Stoke-On-Trent");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("essex"), "Essex");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("éire"), "Éire");
    }

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(collapse_spaces("  High   St  "), "High St");
    }

    #[test]
    fn test_numeric_key_split() {
        let key = NumericKey::new("12 Main St");
        assert_eq!(key.name, "Main St");
        assert_eq!(key.number, Some("12"));
        assert_eq!(key.sortable(), "Main St - 12");

        let key = NumericKey::new("12a Main St");
        assert_eq!(key.number, Some("12a"));

        let key = NumericKey::new("Flat 3 Main St");
        assert_eq!(key.number, None);
        assert_eq!(key.without_number(), "Flat 3 Main St");

        let key = NumericKey::new("12");
        assert_eq!(key.number, None);
    }

    #[test]
    fn test_numeric_key_ordering() {
        let two = NumericKey::new("2 Main St");
        let twelve = NumericKey::new("12 Main St");
        let bare = NumericKey::new("Main St");
        assert!(two < twelve);
        assert!(bare < two);
        assert!(NumericKey::new("12 Acacia Ave") < two);
        assert!(NumericKey::new("12 Main St") < NumericKey::new("12a Main St"));
        assert_ne!(
            NumericKey::new("012 Main St").cmp(&twelve),
            Ordering::Equal
        );
    }
}
