//! Storage backends for persisted index files.
//!
//! An index is a small set of named files (segments plus an `index.meta`
//! commit point). The [`Storage`] trait abstracts where those files live so
//! the same index code runs over a directory on disk or an in-memory map.

pub mod file;
pub mod memory;

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::file::{FileStorage, FileStorageConfig};
use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

/// A flat namespace of named files.
pub trait Storage: Send + Sync + Debug {
    /// Check whether a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Read the whole content of a file.
    fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Write a file, replacing any previous content.
    ///
    /// Implementations must make the replacement atomic: readers observe
    /// either the old or the new content, never a partial write.
    fn write_file(&self, name: &str, data: &[u8]) -> Result<()>;

    /// List the names of all files.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// Prepare the location for writing, failing if it cannot be used.
    fn ensure_writable(&self) -> Result<()>;
}

/// Storage backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorageConfig {
    File(FileStorageConfig),
    Memory(MemoryStorageConfig),
}

/// Creates storage backends from a [`StorageConfig`].
pub struct StorageFactory;

impl StorageFactory {
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::File(file_config) => Ok(Arc::new(FileStorage::new(file_config))),
            StorageConfig::Memory(memory_config) => {
                Ok(Arc::new(MemoryStorage::new(memory_config)))
            }
        }
    }
}
