//! Buffered index writer.
//!
//! Documents are buffered in memory and written as a single segment on
//! [`IndexWriter::commit`]. The commit finishes by replacing `index.meta`,
//! which is what makes the new segment visible to readers.

use std::sync::Arc;

use log::debug;

use crate::analysis::tokenizer::{Token, Tokenizer};
use crate::error::{LabelIndexError, Result};
use crate::lexical::document::Document;
use crate::lexical::segment::{IndexMeta, SegmentData, SegmentInfo, StoredFields, segment_name};
use crate::storage::Storage;

/// Position gap inserted between values of a multi-valued tokenized field,
/// so phrases never match across two values.
const POSITION_INCREMENT_GAP: u32 = 100;

pub struct IndexWriter {
    storage: Arc<dyn Storage>,
    tokenizer: Arc<dyn Tokenizer>,
    meta: IndexMeta,
    buffered_docs: Vec<Document>,
    closed: bool,
}

impl std::fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriter")
            .field("tokenizer", &self.tokenizer.name())
            .field("generation", &self.meta.generation)
            .field("doc_count", &self.meta.doc_count)
            .field("buffered_docs", &self.buffered_docs.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl IndexWriter {
    /// Open a writer over the storage location.
    ///
    /// Fails with a storage error if the location cannot be written to. If
    /// an index is already committed there, new documents are appended to
    /// it.
    pub fn new(storage: Arc<dyn Storage>, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
        storage.ensure_writable()?;
        let meta = IndexMeta::read(storage.as_ref())?.unwrap_or_default();

        Ok(IndexWriter {
            storage,
            tokenizer,
            meta,
            buffered_docs: Vec::new(),
            closed: false,
        })
    }

    /// Buffer a document and return the document ID it will receive.
    pub fn add_document(&mut self, doc: Document) -> Result<u64> {
        self.check_open()?;
        let doc_id = self.meta.doc_count + self.buffered_docs.len() as u64;
        self.buffered_docs.push(doc);
        Ok(doc_id)
    }

    pub fn pending_docs(&self) -> u64 {
        self.buffered_docs.len() as u64
    }

    /// Write buffered documents as a new segment and publish a new commit.
    ///
    /// A commit without buffered documents still writes `index.meta`, so an
    /// index built from zero documents exists afterwards.
    pub fn commit(&mut self) -> Result<()> {
        self.check_open()?;

        let mut meta = self.meta.clone();
        meta.generation += 1;

        if !self.buffered_docs.is_empty() {
            let name = segment_name(meta.generation);
            let data = self.build_segment();
            data.write(self.storage.as_ref(), &name)?;

            meta.segments.push(SegmentInfo {
                name,
                base_doc_id: meta.doc_count,
                doc_count: data.doc_count(),
            });
            meta.doc_count += data.doc_count();
        }

        meta.write(self.storage.as_ref())?;
        debug!(
            "committed generation {} with {} new documents ({} total)",
            meta.generation,
            self.buffered_docs.len(),
            meta.doc_count
        );

        self.meta = meta;
        self.buffered_docs.clear();
        Ok(())
    }

    /// Discard buffered documents.
    pub fn rollback(&mut self) -> Result<()> {
        self.check_open()?;
        self.buffered_docs.clear();
        Ok(())
    }

    /// Commit pending documents and close the writer.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.commit()?;
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(LabelIndexError::invalid_state("index writer is closed"));
        }
        Ok(())
    }

    fn build_segment(&self) -> SegmentData {
        let mut data = SegmentData::default();

        for (local, doc) in self.buffered_docs.iter().enumerate() {
            let local = local as u32;
            let mut stored = StoredFields::new();
            let mut next_positions: ahash::AHashMap<&str, u32> = ahash::AHashMap::new();

            for field in doc.fields() {
                if field.option.stored {
                    stored
                        .entry(field.name.clone())
                        .or_default()
                        .push(field.value.clone());
                }
                if !field.option.indexed {
                    continue;
                }

                let tokens = if field.option.tokenized {
                    self.tokenizer.tokenize(&field.value)
                } else if field.value.is_empty() {
                    Vec::new()
                } else {
                    vec![Token::new(field.value.clone(), 0)]
                };
                if tokens.is_empty() {
                    continue;
                }

                let base = next_positions.entry(field.name.as_str()).or_insert(0);
                let postings = data.fields.entry(field.name.clone()).or_default();
                let mut last = *base;
                for token in &tokens {
                    last = *base + token.position;
                    postings.add_occurrence(&token.text, local, last);
                }
                *base = last + POSITION_INCREMENT_GAP;
            }

            data.stored.push(stored);
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tokenizer::WordTokenizer;
    use crate::lexical::document::FieldOption;
    use crate::lexical::segment::META_FILE;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    fn make_writer(storage: Arc<dyn Storage>) -> IndexWriter {
        IndexWriter::new(storage, Arc::new(WordTokenizer::new())).unwrap()
    }

    #[test]
    fn test_commit_makes_index_visible() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        let mut writer = make_writer(storage.clone());

        let doc = Document::new().with_field("title", "Water supply", FieldOption::text());
        assert_eq!(writer.add_document(doc).unwrap(), 0);
        assert_eq!(writer.pending_docs(), 1);
        assert!(!storage.file_exists(META_FILE));

        writer.commit().unwrap();
        assert_eq!(writer.pending_docs(), 0);
        assert!(storage.file_exists(META_FILE));
        assert!(storage.file_exists("segment_000001.json"));

        let meta = IndexMeta::read(storage.as_ref()).unwrap().unwrap();
        assert_eq!(meta.doc_count, 1);
        assert_eq!(meta.generation, 1);
    }

    #[test]
    fn test_empty_commit_creates_index() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        let mut writer = make_writer(storage.clone());
        writer.close().unwrap();

        let meta = IndexMeta::read(storage.as_ref()).unwrap().unwrap();
        assert_eq!(meta.doc_count, 0);
        assert!(meta.segments.is_empty());
    }

    #[test]
    fn test_append_continues_doc_ids() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        {
            let mut writer = make_writer(storage.clone());
            writer.add_document(Document::new()).unwrap();
            writer.add_document(Document::new()).unwrap();
            writer.close().unwrap();
        }

        let mut writer = make_writer(storage.clone());
        assert_eq!(writer.add_document(Document::new()).unwrap(), 2);
        writer.close().unwrap();

        let meta = IndexMeta::read(storage.as_ref()).unwrap().unwrap();
        assert_eq!(meta.segments.len(), 2);
        assert_eq!(meta.segments[1].base_doc_id, 2);
    }

    #[test]
    fn test_rollback_discards_buffer() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        let mut writer = make_writer(storage.clone());
        writer.add_document(Document::new()).unwrap();
        writer.rollback().unwrap();
        writer.close().unwrap();

        let meta = IndexMeta::read(storage.as_ref()).unwrap().unwrap();
        assert_eq!(meta.doc_count, 0);
    }

    #[test]
    fn test_closed_writer_rejects_documents() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        let mut writer = make_writer(storage);
        writer.close().unwrap();
        assert!(writer.is_closed());
        assert!(writer.add_document(Document::new()).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_unwritable_location() {
        let storage: Arc<dyn Storage> =
            Arc::new(MemoryStorage::new(MemoryStorageConfig { read_only: true }));
        let err = IndexWriter::new(storage, Arc::new(WordTokenizer::new())).unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_multi_valued_positions_are_separated() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        let mut writer = make_writer(storage);
        let doc = Document::new()
            .with_field("text", "water supply", FieldOption::text())
            .with_field("text", "drinking water", FieldOption::text());
        writer.add_document(doc).unwrap();

        let segment = writer.build_segment();
        let water = &segment.fields["text"].terms["water"];
        assert_eq!(water[0].positions, vec![0, 102]);
        assert_eq!(segment.fields["text"].lengths[&0], 4);
    }
}
