//! # Label Index
//!
//! Fuzzy lookup of URIs by their labels, one index per semantic property.
//!
//! Given a phrase such as `"disaster prevention and preparedness"`, a
//! [`LabelIndex`] returns the URIs whose labels resemble it, each scored by
//! a string similarity in `[0, 1]` between the normalized phrase and the
//! URI's closest label.
//!
//! ## Features
//!
//! - Pure Rust inverted index with file or in-memory storage
//! - Fuzzy (edit distance) and word based candidate retrieval
//! - Pluggable normalizer, tokenizer and similarity metric
//! - Build-once indexes, reopened from disk across restarts
//! - Thread-safe per-property registry
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use label_index::{ComponentProperty, IndexRegistry, LabelIndexConfig, MemoryStorageProvider};
//!
//! let registry = IndexRegistry::with_storage_provider(
//!     LabelIndexConfig::default(),
//!     Arc::new(MemoryStorageProvider::new()),
//! )?;
//!
//! let theme = ComponentProperty::new("http://example.org/theme");
//! let index = registry.get_or_fill(&theme, ["urn:water", "urn:energy"], |uri| match uri {
//!     "urn:water" => vec!["Water Supply".to_string(), "Drinking water".to_string()],
//!     _ => vec!["Energy".to_string()],
//! })?;
//!
//! let scored = index.lookup("water supply")?;
//! assert_eq!(scored["urn:water"], 1.0);
//! assert!(!scored.contains_key("urn:energy"));
//! # Ok::<(), label_index::LabelIndexError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod distance;
pub mod error;
pub mod index;
pub mod label;
pub mod lexical;
pub mod property;
pub mod registry;
pub mod storage;

pub use analysis::{Normalizer, StandardNormalizer, Tokenizer, WordTokenizer};
pub use config::{FuzzyConfig, LabelIndexConfig};
pub use distance::{JaroWinklerDistance, LevenshteinDistance, StringDistance};
pub use error::{LabelIndexError, Result};
pub use index::{Index, IndexState};
pub use label::{LabelIndex, ScoredUris, rank_by_score};
pub use property::ComponentProperty;
pub use registry::{FileStorageProvider, IndexRegistry, MemoryStorageProvider, StorageProvider};
pub use storage::{Storage, StorageConfig, StorageFactory};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
