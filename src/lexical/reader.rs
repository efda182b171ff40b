//! Read-only view over a committed index.
//!
//! Opening a reader loads every segment referenced by `index.meta` and
//! merges them into per-field term dictionaries. Term dictionaries are
//! finite state transducers mapping each term to its ordinal in the
//! postings table, which lets fuzzy queries intersect the dictionary with a
//! Levenshtein automaton.

use std::collections::BTreeMap;

use ahash::AHashMap;
use fst::Map;
use log::debug;

use crate::error::{LabelIndexError, Result};
use crate::lexical::segment::{IndexMeta, META_FILE, SegmentData, StoredFields};
use crate::storage::Storage;

/// Occurrences of a term in one document, addressed by global document ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPosting {
    pub doc_id: u64,
    pub positions: Vec<u32>,
}

impl DocPosting {
    pub fn term_freq(&self) -> u32 {
        self.positions.len() as u32
    }
}

/// Merged inverted index of one field.
pub struct FieldIndex {
    dictionary: Map<Vec<u8>>,
    postings: Vec<Vec<DocPosting>>,
    lengths: AHashMap<u64, u32>,
    total_length: u64,
}

impl std::fmt::Debug for FieldIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldIndex")
            .field("terms", &self.postings.len())
            .field("docs", &self.lengths.len())
            .field("total_length", &self.total_length)
            .finish()
    }
}

impl FieldIndex {
    fn build(terms: BTreeMap<String, Vec<DocPosting>>, lengths: AHashMap<u64, u32>) -> Result<Self> {
        let dictionary = Map::from_iter(
            terms
                .keys()
                .enumerate()
                .map(|(ordinal, term)| (term.as_bytes(), ordinal as u64)),
        )
        .map_err(|e| LabelIndexError::storage(format!("failed to build term dictionary: {e}")))?;
        let total_length = lengths.values().map(|&len| len as u64).sum();

        Ok(FieldIndex {
            dictionary,
            postings: terms.into_values().collect(),
            lengths,
            total_length,
        })
    }

    /// The term dictionary, mapping each term to its ordinal.
    pub fn dictionary(&self) -> &Map<Vec<u8>> {
        &self.dictionary
    }

    pub fn postings(&self, term: &str) -> Option<&[DocPosting]> {
        self.dictionary
            .get(term)
            .and_then(|ordinal| self.postings_by_ordinal(ordinal))
    }

    pub fn postings_by_ordinal(&self, ordinal: u64) -> Option<&[DocPosting]> {
        self.postings.get(ordinal as usize).map(Vec::as_slice)
    }

    /// Number of documents containing the term.
    pub fn doc_freq(&self, term: &str) -> u64 {
        self.postings(term).map_or(0, |postings| postings.len() as u64)
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Number of indexed tokens of the field in a document.
    pub fn field_length(&self, doc_id: u64) -> u32 {
        self.lengths.get(&doc_id).copied().unwrap_or(0)
    }

    /// Average field length over documents that have the field.
    pub fn average_length(&self) -> f32 {
        if self.lengths.is_empty() {
            return 0.0;
        }
        self.total_length as f32 / self.lengths.len() as f32
    }
}

#[derive(Debug)]
pub struct IndexReader {
    meta: IndexMeta,
    fields: AHashMap<String, FieldIndex>,
    stored: Vec<StoredFields>,
}

impl IndexReader {
    /// Whether a committed index exists in the storage.
    pub fn exists(storage: &dyn Storage) -> bool {
        storage.file_exists(META_FILE)
    }

    /// Open the latest commit.
    ///
    /// Fails with a storage error when no index has been committed, or when
    /// a referenced segment is missing or corrupt.
    pub fn open(storage: &dyn Storage) -> Result<Self> {
        let meta = IndexMeta::read(storage)?
            .ok_or_else(|| LabelIndexError::storage("no index found at storage location"))?;

        let declared = meta
            .segments
            .iter()
            .try_fold(0u64, |total, info| total.checked_add(info.doc_count));
        if declared != Some(meta.doc_count) {
            return Err(LabelIndexError::storage(format!(
                "index.meta declares {} documents but its segments declare {}",
                meta.doc_count,
                declared.map_or_else(|| "more than u64::MAX".to_string(), |n| n.to_string())
            )));
        }

        let mut merged: AHashMap<String, (BTreeMap<String, Vec<DocPosting>>, AHashMap<u64, u32>)> =
            AHashMap::new();
        let mut stored = Vec::new();

        for info in &meta.segments {
            if info.base_doc_id != stored.len() as u64 {
                return Err(LabelIndexError::storage(format!(
                    "segment {} starts at document {}, expected {}",
                    info.name,
                    info.base_doc_id,
                    stored.len()
                )));
            }

            let segment = SegmentData::read(storage, info)?;
            for (field, postings) in segment.fields {
                let (terms, lengths) = merged.entry(field).or_default();
                for (term, term_postings) in postings.terms {
                    terms
                        .entry(term)
                        .or_default()
                        .extend(term_postings.into_iter().map(|posting| DocPosting {
                            doc_id: info.base_doc_id + posting.doc as u64,
                            positions: posting.positions,
                        }));
                }
                for (doc, length) in postings.lengths {
                    lengths.insert(info.base_doc_id + doc as u64, length);
                }
            }
            stored.extend(segment.stored);
        }

        if stored.len() as u64 != meta.doc_count {
            return Err(LabelIndexError::storage(format!(
                "index.meta declares {} documents but segments hold {}",
                meta.doc_count,
                stored.len()
            )));
        }

        let mut fields = AHashMap::with_capacity(merged.len());
        for (name, (terms, lengths)) in merged {
            fields.insert(name, FieldIndex::build(terms, lengths)?);
        }

        debug!(
            "opened index generation {} with {} documents in {} segments",
            meta.generation,
            meta.doc_count,
            meta.segments.len()
        );

        Ok(IndexReader {
            meta,
            fields,
            stored,
        })
    }

    pub fn doc_count(&self) -> u64 {
        self.meta.doc_count
    }

    pub fn generation(&self) -> u64 {
        self.meta.generation
    }

    pub fn field(&self, name: &str) -> Option<&FieldIndex> {
        self.fields.get(name)
    }

    /// Stored values of a field in a document; empty when the document has
    /// no stored value for the field.
    pub fn stored_values(&self, doc_id: u64, field: &str) -> Result<&[String]> {
        let stored = self.stored.get(doc_id as usize).ok_or_else(|| {
            LabelIndexError::invalid_argument(format!(
                "document {doc_id} out of range (index holds {})",
                self.stored.len()
            ))
        })?;
        Ok(stored.get(field).map(Vec::as_slice).unwrap_or(&[]))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analysis::tokenizer::WordTokenizer;
    use crate::lexical::document::{Document, FieldOption};
    use crate::lexical::writer::IndexWriter;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    fn write_docs(storage: Arc<dyn Storage>, docs: Vec<Document>) {
        let mut writer = IndexWriter::new(storage, Arc::new(WordTokenizer::new())).unwrap();
        for doc in docs {
            writer.add_document(doc).unwrap();
        }
        writer.close().unwrap();
    }

    #[test]
    fn test_open_missing_index() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        assert!(!IndexReader::exists(&storage));
        assert!(IndexReader::open(&storage).unwrap_err().is_storage());
    }

    #[test]
    fn test_merges_segments() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        write_docs(
            storage.clone(),
            vec![Document::new().with_field("text", "water supply", FieldOption::text())],
        );
        write_docs(
            storage.clone(),
            vec![Document::new().with_field("text", "drinking water", FieldOption::text())],
        );

        let reader = IndexReader::open(storage.as_ref()).unwrap();
        assert_eq!(reader.doc_count(), 2);
        assert_eq!(reader.generation(), 2);

        let text = reader.field("text").unwrap();
        assert_eq!(text.term_count(), 3);
        assert_eq!(text.doc_freq("water"), 2);
        let doc_ids: Vec<u64> = text.postings("water").unwrap().iter().map(|p| p.doc_id).collect();
        assert_eq!(doc_ids, vec![0, 1]);
        assert_eq!(text.field_length(1), 2);
        assert!((text.average_length() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_stored_values() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        write_docs(
            storage.clone(),
            vec![
                Document::new()
                    .with_field("uri", "u1", FieldOption::keyword())
                    .with_field("original", "Water", FieldOption::stored_only())
                    .with_field("original", "Water Supply", FieldOption::stored_only()),
            ],
        );

        let reader = IndexReader::open(storage.as_ref()).unwrap();
        assert_eq!(reader.stored_values(0, "uri").unwrap(), ["u1"]);
        assert_eq!(reader.stored_values(0, "original").unwrap(), ["Water", "Water Supply"]);
        assert!(reader.stored_values(0, "missing").unwrap().is_empty());
        assert!(reader.stored_values(5, "uri").is_err());
        // Stored-only fields are not searchable.
        assert!(reader.field("original").is_none());
    }

    #[test]
    fn test_missing_segment_is_storage_error() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        write_docs(
            storage.clone(),
            vec![Document::new().with_field("text", "water", FieldOption::text())],
        );
        storage.delete_file("segment_000001.json").unwrap();

        assert!(IndexReader::open(storage.as_ref()).unwrap_err().is_storage());
    }

    #[test]
    fn test_inconsistent_doc_count_is_storage_error() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        storage
            .write_file(
                "index.meta",
                br#"{"version":1,"generation":1,"doc_count":18446744073709551615,"segments":[]}"#,
            )
            .unwrap();
        assert!(IndexReader::open(&storage).unwrap_err().is_storage());

        storage
            .write_file(
                "index.meta",
                br#"{"version":1,"generation":2,"doc_count":3,"segments":[
                    {"name":"segment_000001.json","base_doc_id":0,"doc_count":18446744073709551615},
                    {"name":"segment_000002.json","base_doc_id":0,"doc_count":4}]}"#,
            )
            .unwrap();
        assert!(IndexReader::open(&storage).unwrap_err().is_storage());
    }
}
