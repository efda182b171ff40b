//! String similarity metrics used to re-score search hits.
//!
//! The search engine's native ranking reflects term statistics, which are
//! not comparable across indexes. Hits are therefore re-scored with a
//! bounded similarity in `[0, 1]`, where `1.0` means identical.

use std::fmt::Debug;

pub trait StringDistance: Send + Sync + Debug {
    /// Similarity between two normalized strings, in `[0, 1]`.
    fn distance(&self, a: &str, b: &str) -> f64;

    fn name(&self) -> &'static str;
}

/// `1 - levenshtein(a, b) / max(len(a), len(b))`, counted in characters.
///
/// Two empty strings are identical and score `1.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinDistance;

impl LevenshteinDistance {
    pub fn new() -> Self {
        LevenshteinDistance
    }
}

impl StringDistance for LevenshteinDistance {
    fn distance(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }

    fn name(&self) -> &'static str {
        "levenshtein"
    }
}

/// Jaro-Winkler similarity, favouring strings that share a prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinklerDistance;

impl JaroWinklerDistance {
    pub fn new() -> Self {
        JaroWinklerDistance
    }
}

impl StringDistance for JaroWinklerDistance {
    fn distance(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }

    fn name(&self) -> &'static str {
        "jaro_winkler"
    }
}
