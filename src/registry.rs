//! Per-property registry of label indexes.
//!
//! The registry hands out exactly one [`LabelIndex`] per property for its
//! whole lifetime. Entries are created lazily and never removed.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::analysis::normalizer::Normalizer;
use crate::analysis::tokenizer::Tokenizer;
use crate::config::LabelIndexConfig;
use crate::distance::StringDistance;
use crate::error::{LabelIndexError, Result};
use crate::label::LabelIndex;
use crate::property::ComponentProperty;
use crate::storage::file::FileStorageConfig;
use crate::storage::memory::MemoryStorageConfig;
use crate::storage::{Storage, StorageConfig, StorageFactory};

/// Maps a property to the storage location of its index.
pub trait StorageProvider: Send + Sync + Debug {
    fn storage(&self, property: &ComponentProperty) -> Result<Arc<dyn Storage>>;
}

/// One directory per property under a common root, named by
/// [`ComponentProperty::storage_key`].
#[derive(Debug, Clone)]
pub struct FileStorageProvider {
    root: PathBuf,
}

impl FileStorageProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FileStorageProvider {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the directory holding the per-property locations.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StorageProvider for FileStorageProvider {
    fn storage(&self, property: &ComponentProperty) -> Result<Arc<dyn Storage>> {
        let path = self.root.join(property.storage_key());
        StorageFactory::create(StorageConfig::File(FileStorageConfig::new(path)))
    }
}

/// A fresh in-memory location per property. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageProvider;

impl MemoryStorageProvider {
    pub fn new() -> Self {
        MemoryStorageProvider
    }
}

impl StorageProvider for MemoryStorageProvider {
    fn storage(&self, _property: &ComponentProperty) -> Result<Arc<dyn Storage>> {
        StorageFactory::create(StorageConfig::Memory(MemoryStorageConfig::default()))
    }
}

type Entry = Arc<OnceCell<Arc<LabelIndex>>>;

/// Lazily creates and caches one [`LabelIndex`] per property.
///
/// # Example
///
/// ```
/// use label_index::{ComponentProperty, IndexRegistry, LabelIndexConfig, MemoryStorageProvider};
/// use std::sync::Arc;
///
/// let registry = IndexRegistry::with_storage_provider(
///     LabelIndexConfig::default(),
///     Arc::new(MemoryStorageProvider::new()),
/// )
/// .unwrap();
///
/// let theme = ComponentProperty::new("http://example.org/theme");
/// let index = registry
///     .get_or_fill(&theme, ["http://example.org/water"], |_| vec!["Water Supply".to_string()])
///     .unwrap();
///
/// let scored = index.lookup("water supply").unwrap();
/// assert_eq!(scored["http://example.org/water"], 1.0);
/// ```
#[derive(Debug)]
pub struct IndexRegistry {
    config: LabelIndexConfig,
    provider: Arc<dyn StorageProvider>,
    normalizer: Option<Arc<dyn Normalizer>>,
    distance: Option<Arc<dyn StringDistance>>,
    tokenizer: Option<Arc<dyn Tokenizer>>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl IndexRegistry {
    /// Registry storing each property's index under `config.storage_path`.
    pub fn new(config: LabelIndexConfig) -> Result<Self> {
        let provider = Arc::new(FileStorageProvider::new(&config.storage_path));
        Self::with_storage_provider(config, provider)
    }

    pub fn with_storage_provider(
        config: LabelIndexConfig,
        provider: Arc<dyn StorageProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(IndexRegistry {
            config,
            provider,
            normalizer: None,
            distance: None,
            tokenizer: None,
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// Normalize labels and queries of every index with `normalizer`
    /// instead of [`StandardNormalizer`](crate::StandardNormalizer).
    ///
    /// A normalizer change does not rebuild indexes already on disk.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Re-score hits with `distance` instead of
    /// [`LevenshteinDistance`](crate::LevenshteinDistance).
    pub fn with_distance(mut self, distance: Arc<dyn StringDistance>) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Split text labels and query words with `tokenizer` instead of
    /// [`WordTokenizer`](crate::WordTokenizer).
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    /// Get the configuration shared by all indexes.
    pub fn config(&self) -> &LabelIndexConfig {
        &self.config
    }

    /// The index of `property`, created unbuilt if it does not exist yet.
    ///
    /// An unbuilt index must be filled with [`LabelIndex::fill`] before it
    /// serves lookups.
    pub fn get(&self, property: &ComponentProperty) -> Result<Arc<LabelIndex>> {
        let entry = self.entry(property);
        entry.get_or_try_init(|| self.create(property)).cloned()
    }

    /// The index of `property`, built from `uris` and opened for reads.
    ///
    /// The first caller creates and fills the index before anyone can see
    /// it; concurrent callers for the same property wait for it. Later
    /// callers get the same instance and `label_fn` is not called again.
    pub fn get_or_fill<I, S, F, L>(
        &self,
        property: &ComponentProperty,
        uris: I,
        label_fn: F,
    ) -> Result<Arc<LabelIndex>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&str) -> L,
        L: IntoIterator<Item = String>,
    {
        let entry = self.entry(property);
        let mut build = Some((uris, label_fn));
        let index = entry
            .get_or_try_init(|| {
                let index = self.create(property)?;
                if let Some((uris, label_fn)) = build.take() {
                    index.fill(uris, label_fn)?;
                }
                Ok::<_, LabelIndexError>(index)
            })?
            .clone();

        // Published earlier by `get`, possibly still unbuilt.
        if let Some((uris, label_fn)) = build {
            index.fill(uris, label_fn)?;
        }
        Ok(index)
    }

    /// Number of properties with an index.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|entry| entry.get().is_some())
            .count()
    }

    /// Whether no property has an index yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `property` already has an index, built or not.
    pub fn contains(&self, property: &ComponentProperty) -> bool {
        self.entries
            .lock()
            .get(property.uri())
            .is_some_and(|entry| entry.get().is_some())
    }

    fn entry(&self, property: &ComponentProperty) -> Entry {
        self.entries
            .lock()
            .entry(property.uri().to_string())
            .or_default()
            .clone()
    }

    fn create(&self, property: &ComponentProperty) -> Result<Arc<LabelIndex>> {
        let storage = self.provider.storage(property)?;
        debug!("registry: created label index for {property} over {storage:?}");
        let mut index = LabelIndex::new(property.clone(), storage, self.config.clone());
        if let Some(normalizer) = &self.normalizer {
            index = index.with_normalizer(normalizer.clone());
        }
        if let Some(distance) = &self.distance {
            index = index.with_distance(distance.clone());
        }
        if let Some(tokenizer) = &self.tokenizer {
            index = index.with_tokenizer(tokenizer.clone());
        }
        Ok(Arc::new(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> IndexRegistry {
        IndexRegistry::with_storage_provider(
            LabelIndexConfig::default(),
            Arc::new(MemoryStorageProvider::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_get_returns_same_instance() {
        let registry = registry();
        let theme = ComponentProperty::new("http://example.org/theme");
        assert!(registry.is_empty());

        let a = registry.get(&theme).unwrap();
        let b = registry.get(&theme).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!a.is_readable());
        assert!(registry.contains(&theme));
        assert_eq!(registry.len(), 1);

        let other = registry
            .get(&ComponentProperty::new("http://example.org/area"))
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_get_or_fill_builds_unbuilt_instance() {
        let registry = registry();
        let theme = ComponentProperty::new("http://example.org/theme");
        let unbuilt = registry.get(&theme).unwrap();

        let built = registry
            .get_or_fill(&theme, ["u1"], |_| vec!["Water".to_string()])
            .unwrap();
        assert!(Arc::ptr_eq(&unbuilt, &built));
        assert!(built.is_readable());
        assert_eq!(built.lookup("water").unwrap()["u1"], 1.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = IndexRegistry::with_storage_provider(
            LabelIndexConfig::default().with_top_k(0),
            Arc::new(MemoryStorageProvider::new()),
        )
        .unwrap_err();
        assert!(matches!(err, LabelIndexError::InvalidConfig(_)));
    }

    #[test]
    fn test_failed_build_is_not_published() {
        #[derive(Debug)]
        struct ReadOnlyProvider;

        impl StorageProvider for ReadOnlyProvider {
            fn storage(&self, _property: &ComponentProperty) -> Result<Arc<dyn Storage>> {
                StorageFactory::create(StorageConfig::Memory(MemoryStorageConfig {
                    read_only: true,
                }))
            }
        }

        let registry = IndexRegistry::with_storage_provider(
            LabelIndexConfig::default(),
            Arc::new(ReadOnlyProvider),
        )
        .unwrap();
        let theme = ComponentProperty::new("http://example.org/theme");
        let err = registry
            .get_or_fill(&theme, ["u1"], |_| vec!["Water".to_string()])
            .unwrap_err();
        assert!(err.is_storage());
        assert!(!registry.contains(&theme));
    }
}
