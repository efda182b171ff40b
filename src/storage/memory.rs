//! In-memory storage, used by tests and ephemeral pipelines.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{LabelIndexError, Result};
use crate::storage::Storage;

/// Configuration for [`MemoryStorage`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStorageConfig {
    /// Reject all writes, simulating a read-only location.
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    config: MemoryStorageConfig,
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new(config: MemoryStorageConfig) -> Self {
        MemoryStorage {
            config,
            files: RwLock::new(HashMap::new()),
        }
    }
}

impl Storage for MemoryStorage {
    fn file_exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| LabelIndexError::storage(format!("file {name} not found in memory")))
    }

    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        self.files.write().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.files.write().remove(name);
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.config.read_only {
            return Err(LabelIndexError::storage("memory storage is read-only"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        storage.write_file("segment_000000.json", b"{}").unwrap();
        assert!(storage.file_exists("segment_000000.json"));
        assert_eq!(storage.read_file("segment_000000.json").unwrap(), b"{}");
        assert!(storage.read_file("index.meta").unwrap_err().is_storage());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let storage = MemoryStorage::new(MemoryStorageConfig { read_only: true });
        assert!(storage.write_file("x", b"y").unwrap_err().is_storage());
        assert!(!storage.file_exists("x"));
    }
}
