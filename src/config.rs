//! Configuration for label indexes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LabelIndexError, Result};

/// Options of the fuzzy query run over exact labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Maximum edit distance, at most 2.
    pub max_edits: u32,
    /// Leading characters that must match exactly.
    pub prefix_length: u32,
    /// Maximum number of dictionary terms a fuzzy query expands to.
    pub max_expansions: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        FuzzyConfig {
            max_edits: 2,
            prefix_length: 0,
            max_expansions: 50,
        }
    }
}

/// Configuration shared by all label indexes of a registry.
///
/// Missing keys take their default when deserialized:
///
/// ```
/// use label_index::LabelIndexConfig;
///
/// let config = LabelIndexConfig::from_json_str(r#"{ "top_k": 20 }"#).unwrap();
/// assert_eq!(config.top_k, 20);
/// assert_eq!(config.min_fuzzy_length, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelIndexConfig {
    /// Root directory under which each property gets its own index.
    pub storage_path: PathBuf,
    /// Normalized queries at least this many characters long also run a
    /// fuzzy query over exact labels.
    pub min_fuzzy_length: usize,
    /// Number of hits retrieved per query before re-scoring.
    pub top_k: usize,
    pub fuzzy: FuzzyConfig,
}

impl Default for LabelIndexConfig {
    fn default() -> Self {
        LabelIndexConfig {
            storage_path: PathBuf::from("index"),
            min_fuzzy_length: 5,
            top_k: 10,
            fuzzy: FuzzyConfig::default(),
        }
    }
}

impl LabelIndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LabelIndexConfig = serde_json::from_str(json)
            .map_err(|e| LabelIndexError::invalid_config(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(LabelIndexError::invalid_config(
                "top_k must be greater than zero",
            ));
        }
        if self.fuzzy.max_edits > 2 {
            return Err(LabelIndexError::invalid_config(format!(
                "fuzzy.max_edits must be at most 2, got {}",
                self.fuzzy.max_edits
            )));
        }
        if self.fuzzy.max_expansions == 0 {
            return Err(LabelIndexError::invalid_config(
                "fuzzy.max_expansions must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn with_storage_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.storage_path = path.into();
        self
    }

    pub fn with_min_fuzzy_length(mut self, min_fuzzy_length: usize) -> Self {
        self.min_fuzzy_length = min_fuzzy_length;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_fuzzy(mut self, fuzzy: FuzzyConfig) -> Self {
        self.fuzzy = fuzzy;
        self
    }
}
