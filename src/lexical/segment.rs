//! On-disk index format.
//!
//! ```text
//! index.meta              commit point: generation, doc count, segment list
//! segment_000001.json     stored fields and postings of one commit
//! segment_000002.json
//! ```
//!
//! A segment becomes visible only once an `index.meta` referencing it has
//! been written. `index.meta` is replaced atomically, so a crash between
//! writing a segment and writing the meta leaves the previous commit (or no
//! index at all) in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LabelIndexError, Result};
use crate::storage::Storage;

pub const META_FILE: &str = "index.meta";
pub const FORMAT_VERSION: u32 = 1;

/// Stored field values of one document.
pub type StoredFields = BTreeMap<String, Vec<String>>;

/// File name of the segment written by the given commit generation.
pub fn segment_name(generation: u64) -> String {
    format!("segment_{generation:06}.json")
}

/// The commit point of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub generation: u64,
    pub doc_count: u64,
    pub segments: Vec<SegmentInfo>,
}

impl Default for IndexMeta {
    fn default() -> Self {
        IndexMeta {
            version: FORMAT_VERSION,
            generation: 0,
            doc_count: 0,
            segments: Vec::new(),
        }
    }
}

impl IndexMeta {
    /// Read the commit point, or `None` when no index has been committed.
    pub fn read(storage: &dyn Storage) -> Result<Option<Self>> {
        if !storage.file_exists(META_FILE) {
            return Ok(None);
        }
        let bytes = storage.read_file(META_FILE)?;
        let meta: IndexMeta = serde_json::from_slice(&bytes)
            .map_err(|e| LabelIndexError::storage(format!("corrupt {META_FILE}: {e}")))?;
        if meta.version != FORMAT_VERSION {
            return Err(LabelIndexError::storage(format!(
                "unsupported index format version {} (expected {FORMAT_VERSION})",
                meta.version
            )));
        }
        Ok(Some(meta))
    }

    pub fn write(&self, storage: &dyn Storage) -> Result<()> {
        let bytes = serde_json::to_vec(self)?;
        storage.write_file(META_FILE, &bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentInfo {
    pub name: String,
    pub base_doc_id: u64,
    pub doc_count: u64,
}

/// Occurrences of a term in one document of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Segment-local document number.
    pub doc: u32,
    pub positions: Vec<u32>,
}

/// Inverted postings of one field within a segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPostings {
    pub terms: BTreeMap<String, Vec<Posting>>,
    /// Number of indexed tokens per segment-local document.
    pub lengths: BTreeMap<u32, u32>,
}

impl FieldPostings {
    /// Record one occurrence. Documents must be added in ascending order.
    pub fn add_occurrence(&mut self, term: &str, doc: u32, position: u32) {
        let postings = self.terms.entry(term.to_string()).or_default();
        match postings.last_mut() {
            Some(posting) if posting.doc == doc => posting.positions.push(position),
            _ => postings.push(Posting {
                doc,
                positions: vec![position],
            }),
        }
        *self.lengths.entry(doc).or_insert(0) += 1;
    }
}

/// Contents of one segment file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentData {
    pub stored: Vec<StoredFields>,
    pub fields: BTreeMap<String, FieldPostings>,
}

impl SegmentData {
    pub fn doc_count(&self) -> u64 {
        self.stored.len() as u64
    }

    pub fn read(storage: &dyn Storage, info: &SegmentInfo) -> Result<Self> {
        let bytes = storage.read_file(&info.name).map_err(|e| {
            LabelIndexError::storage(format!("segment {} is unreadable: {e}", info.name))
        })?;
        let data: SegmentData = serde_json::from_slice(&bytes)
            .map_err(|e| LabelIndexError::storage(format!("corrupt segment {}: {e}", info.name)))?;
        if data.doc_count() != info.doc_count {
            return Err(LabelIndexError::storage(format!(
                "segment {} holds {} documents, index.meta expects {}",
                info.name,
                data.doc_count(),
                info.doc_count
            )));
        }
        Ok(data)
    }

    pub fn write(&self, storage: &dyn Storage, name: &str) -> Result<()> {
        let bytes = serde_json::to_vec(self)?;
        storage.write_file(name, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    #[test]
    fn test_segment_name() {
        assert_eq!(segment_name(1), "segment_000001.json");
        assert_eq!(segment_name(1234567), "segment_1234567.json");
    }

    #[test]
    fn test_missing_meta_means_no_index() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        assert_eq!(IndexMeta::read(&storage).unwrap(), None);
    }

    #[test]
    fn test_garbage_meta_is_storage_error() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        storage.write_file(META_FILE, b"not json").unwrap();
        assert!(IndexMeta::read(&storage).unwrap_err().is_storage());
    }

    #[test]
    fn test_segment_doc_count_mismatch() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        let data = SegmentData {
            stored: vec![StoredFields::new()],
            fields: BTreeMap::new(),
        };
        data.write(&storage, "segment_000001.json").unwrap();

        let info = SegmentInfo {
            name: "segment_000001.json".to_string(),
            base_doc_id: 0,
            doc_count: 2,
        };
        assert!(SegmentData::read(&storage, &info).unwrap_err().is_storage());
    }

    #[test]
    fn test_add_occurrence_groups_positions() {
        let mut postings = FieldPostings::default();
        postings.add_occurrence("water", 0, 0);
        postings.add_occurrence("water", 0, 3);
        postings.add_occurrence("water", 1, 0);

        let water = &postings.terms["water"];
        assert_eq!(water.len(), 2);
        assert_eq!(water[0].positions, vec![0, 3]);
        assert_eq!(postings.lengths[&0], 2);
        assert_eq!(postings.lengths[&1], 1);
    }
}
