//! License plate normalization and format validation
//!
//! A plate is operator-supplied text. Two strings refer to the same plate when
//! they normalize to the same [`PlateKey`]. Validation is purely syntactic and
//! runs on the normalized form, so `"12 ab 345"` and `"12 AB 345"` are both
//! accepted and stored under the same key.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Anchored patterns of the accepted plate shapes, matched against the
/// normalized plate.
///
/// The 2-2-3 and 3-2-2 digit plates share the spaceless literal `0000000`;
/// both entries stay listed, the matcher compiles that pattern once.
pub const PLATE_PATTERNS: [&str; 8] = [
    r"^[0-9]{2} [0-9]{2} [0-9]{3}$",
    r"^[0-9]{3} [A-Z]{2} [0-9]{2}$",
    r"^[0-9]{3} [0-9]{2} [0-9]{2}$",
    r"^[0-9]{2} [A-Z]{2} [0-9]{3}$",
    r"^[0-9]{7}$",
    r"^[0-9]{3}[A-Z]{2}[0-9]{2}$",
    r"^[0-9]{7}$",
    r"^[0-9]{2}[A-Z]{2}[0-9]{3}$",
];

/// Human-readable format list for help and error messages
///
/// Pairs each spaced shape with its spaceless twin.
pub const ACCEPTED_FORMATS: [&str; 4] = [
    "00 00 000 or 0000000",
    "000 AB 00 or 000AB00",
    "000 00 00 or 0000000",
    "00 AB 000 or 00AB000",
];

static PLATE_MATCHER: Lazy<RegexSet> = Lazy::new(|| {
    let mut patterns: Vec<&str> = Vec::with_capacity(PLATE_PATTERNS.len());
    for pattern in PLATE_PATTERNS {
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }
    RegexSet::new(patterns).expect("plate patterns are valid regular expressions")
});

/// Canonical plate string used as storage and lookup key
///
/// Trimmed, upper-cased, internal whitespace collapsed to single spaces.
/// A `PlateKey` built with [`normalize`] is not necessarily a valid plate;
/// use [`PlateKey::parse`] to get one that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlateKey(String);

impl PlateKey {
    /// Normalize and validate operator input
    pub fn parse(raw: &str) -> Result<Self> {
        let key = normalize(raw);
        if matches_accepted_shape(key.as_str()) {
            Ok(key)
        } else {
            Err(Error::InvalidPlate(raw.to_string()))
        }
    }

    /// Wrap a key read back from storage (already normalized on write)
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map raw input to its canonical key. Total: every string has a key.
pub fn normalize(raw: &str) -> PlateKey {
    let upper = raw.trim().to_uppercase();
    PlateKey(upper.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// True iff the normalized input fully matches one accepted shape
pub fn validate(raw: &str) -> bool {
    matches_accepted_shape(normalize(raw).as_str())
}

fn matches_accepted_shape(normalized: &str) -> bool {
    PLATE_MATCHER.is_match(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_case_and_whitespace() {
        assert_eq!(normalize("ab  12   34").as_str(), "AB 12 34");
        assert_eq!(normalize("AB 12 34").as_str(), "AB 12 34");
        assert_eq!(normalize("  12\tab \n 345 ").as_str(), "12 AB 345");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = ["", "   ", " 12 ab 345", "x\t\ty", "000AB00", "ß straße"];
        for input in inputs {
            let once = normalize(input);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "normalize not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_normalize_empty_is_empty_key() {
        assert_eq!(normalize("").as_str(), "");
        assert_eq!(normalize(" \t\n").as_str(), "");
    }

    #[test]
    fn test_each_accepted_shape() {
        assert!(validate("12 34 567"));
        assert!(validate("123 AB 45"));
        assert!(validate("123 45 67"));
        assert!(validate("12 AB 345"));
        assert!(validate("1234567"));
        assert!(validate("123AB45"));
        assert!(validate("12AB345"));
    }

    #[test]
    fn test_validation_runs_after_normalization() {
        assert!(validate("123ab45"));
        assert!(validate("  12   ab   345 "));
        assert!(validate("12 ab 345"));
    }

    #[test]
    fn test_rejected_shapes() {
        assert!(!validate("AB 1234"));
        assert!(!validate(""));
        assert!(!validate("123456"));
        assert!(!validate("12345678"));
        assert!(!validate("12 34567"));
        assert!(!validate("123 A 45"));
        assert!(!validate("123-AB-45"));
        assert!(!validate("1234 AB 5"));
        assert!(!validate("12AB34"));
        assert!(!validate("x1234567"));
    }

    #[test]
    fn test_non_ascii_digits_and_letters_rejected() {
        // Arabic-Indic digits and Cyrillic letters are not accepted
        assert!(!validate("١٢٣٤٥٦٧"));
        assert!(!validate("123АВ45"));
    }

    #[test]
    fn test_parse_returns_normalized_key() {
        let key = PlateKey::parse(" 123 ab 45 ").unwrap();
        assert_eq!(key.as_str(), "123 AB 45");
        assert_eq!(key.to_string(), "123 AB 45");
    }

    #[test]
    fn test_parse_rejects_with_original_text() {
        match PlateKey::parse("AB 1234") {
            Err(Error::InvalidPlate(raw)) => assert_eq!(raw, "AB 1234"),
            other => panic!("expected InvalidPlate, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_shape_compiled_once() {
        assert_eq!(PLATE_PATTERNS.len(), 8);
        assert_eq!(PLATE_MATCHER.len(), 7);
    }
}
