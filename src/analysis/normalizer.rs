//! Label normalization.

use std::fmt::Debug;

use unicode_normalization::UnicodeNormalization;

/// Canonicalizes raw label strings for storage and querying.
///
/// Implementations must be pure and total: equal inputs always produce
/// equal outputs and normalization never fails.
pub trait Normalizer: Send + Sync + Debug {
    fn normalize(&self, text: &str) -> String;

    fn name(&self) -> &'static str;
}

/// NFKC folding, lowercasing, and collapsing of every run of
/// non-alphanumeric characters into a single space.
///
/// Leading and trailing separators are dropped, so a string made only of
/// punctuation and whitespace normalizes to the empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNormalizer;

impl StandardNormalizer {
    pub fn new() -> Self {
        StandardNormalizer
    }
}

impl Normalizer for StandardNormalizer {
    fn normalize(&self, text: &str) -> String {
        let mut normalized = String::with_capacity(text.len());
        let mut pending_separator = false;

        for c in text.nfkc() {
            if c.is_alphanumeric() {
                if pending_separator && !normalized.is_empty() {
                    normalized.push(' ');
                }
                pending_separator = false;
                normalized.extend(c.to_lowercase());
            } else {
                pending_separator = true;
            }
        }

        normalized
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_whitespace() {
        let normalizer = StandardNormalizer::new();
        assert_eq!(normalizer.normalize("  Water   Supply "), "water supply");
        assert_eq!(normalizer.normalize("Disaster\tprevention"), "disaster prevention");
    }

    #[test]
    fn test_punctuation_collapses_to_single_space() {
        let normalizer = StandardNormalizer::new();
        assert_eq!(normalizer.normalize("civil-society, (NGOs)"), "civil society ngos");
        assert_eq!(normalizer.normalize("a--b"), "a b");
    }

    #[test]
    fn test_only_separators_normalize_to_empty() {
        let normalizer = StandardNormalizer::new();
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("   "), "");
        assert_eq!(normalizer.normalize("?!- ..."), "");
    }

    #[test]
    fn test_compatibility_forms_are_folded() {
        let normalizer = StandardNormalizer::new();
        // Fullwidth letters and the "fi" ligature fold under NFKC.
        assert_eq!(normalizer.normalize("ＷＡＴＥＲ"), "water");
        assert_eq!(normalizer.normalize("\u{FB01}nland"), "finland");
    }

    #[test]
    fn test_idempotent() {
        let normalizer = StandardNormalizer::new();
        let once = normalizer.normalize("Drinking-Water Supply!");
        assert_eq!(normalizer.normalize(&once), once);
    }
}
