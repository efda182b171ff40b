//! Directory-backed storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LabelIndexError, Result};
use crate::storage::Storage;

const TEMP_SUFFIX: &str = ".tmp";

/// Configuration for [`FileStorage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStorageConfig {
    /// Directory holding the index files.
    pub path: PathBuf,
}

impl FileStorageConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileStorageConfig {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Storage that keeps every file in a single directory.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(config: FileStorageConfig) -> Self {
        FileStorage { root: config.path }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Storage for FileStorage {
    fn file_exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        fs::read(self.path_of(name)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LabelIndexError::storage(format!(
                "file {name} not found in {}",
                self.root.display()
            )),
            _ => LabelIndexError::Io(e),
        })
    }

    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        let target = self.path_of(name);
        let temp = self.path_of(&format!("{name}{TEMP_SUFFIX}"));
        fs::write(&temp, data)?;
        fs::rename(&temp, &target)?;
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && let Some(name) = entry.file_name().to_str()
                && !name.ends_with(TEMP_SUFFIX)
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(LabelIndexError::storage(format!(
                "{} exists and is not a directory",
                self.root.display()
            )));
        }
        fs::create_dir_all(&self.root).map_err(|e| {
            LabelIndexError::storage(format!("cannot create {}: {e}", self.root.display()))
        })
    }
}
