//! Generic index lifecycle.
//!
//! An [`Index`] owns one storage location and moves through four states:
//!
//! ```text
//! Closed --start_writes--> Writing --stop_writes--> Flushed --open_reads--> Reading
//! ```
//!
//! Documents can only be added while `Writing`, and searches need the read
//! session opened by `open_reads`. The analysis components used for both
//! sides (normalizer, tokenizer, distance metric, query parser) are held
//! here so writes and queries always agree.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};

use crate::analysis::normalizer::{Normalizer, StandardNormalizer};
use crate::analysis::tokenizer::{Tokenizer, WordTokenizer};
use crate::distance::{LevenshteinDistance, StringDistance};
use crate::error::{LabelIndexError, Result};
use crate::lexical::document::Document;
use crate::lexical::query::Query;
use crate::lexical::query::parser::QueryParser;
use crate::lexical::reader::IndexReader;
use crate::lexical::search::{InvertedIndexSearcher, Searcher};
use crate::lexical::writer::IndexWriter;
use crate::storage::Storage;

/// Lifecycle state of an [`Index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexState {
    /// No session is open.
    Closed,
    /// A write session is open.
    Writing,
    /// The last write session was committed and closed.
    Flushed,
    /// A read session is open.
    Reading,
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexState::Closed => "closed",
            IndexState::Writing => "writing",
            IndexState::Flushed => "flushed",
            IndexState::Reading => "reading",
        };
        f.write_str(name)
    }
}

pub struct Index {
    name: String,
    storage: Arc<dyn Storage>,
    normalizer: Arc<dyn Normalizer>,
    distance: Arc<dyn StringDistance>,
    tokenizer: Arc<dyn Tokenizer>,
    parser: QueryParser,
    writer: Mutex<Option<IndexWriter>>,
    searcher: RwLock<Option<Arc<dyn Searcher>>>,
    state: Mutex<IndexState>,
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.name)
            .field("storage", &self.storage)
            .field("normalizer", &self.normalizer.name())
            .field("distance", &self.distance.name())
            .field("tokenizer", &self.tokenizer.name())
            .field("default_field", &self.parser.default_field())
            .field("state", &self.state())
            .finish()
    }
}

impl Index {
    /// Create a closed index over `storage`. Parsed queries target
    /// `default_field` unless they name a field.
    pub fn new<N: Into<String>, F: Into<String>>(
        name: N,
        storage: Arc<dyn Storage>,
        default_field: F,
    ) -> Self {
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(WordTokenizer::new());
        Index {
            name: name.into(),
            storage,
            normalizer: Arc::new(StandardNormalizer::new()),
            distance: Arc::new(LevenshteinDistance::new()),
            parser: QueryParser::new(default_field).with_tokenizer(tokenizer.clone()),
            tokenizer,
            writer: Mutex::new(None),
            searcher: RwLock::new(None),
            state: Mutex::new(IndexState::Closed),
        }
    }

    /// Replace the normalizer applied to labels and queries.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Replace the similarity metric used to re-score hits.
    pub fn with_distance(mut self, distance: Arc<dyn StringDistance>) -> Self {
        self.distance = distance;
        self
    }

    /// Replace the tokenizer used by both the writer and the query parser.
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.parser = self.parser.with_tokenizer(tokenizer.clone());
        self.tokenizer = tokenizer;
        self
    }

    /// Get the index name used in log messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> IndexState {
        *self.state.lock()
    }

    /// Whether a committed index is present at the storage location.
    pub fn exists(&self) -> bool {
        IndexReader::exists(self.storage.as_ref())
    }

    /// Open a write session.
    pub fn start_writes(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        let mut state = self.state.lock();
        match *state {
            IndexState::Writing => {
                return Err(LabelIndexError::invalid_state(format!(
                    "index {} already has an open write session",
                    self.name
                )));
            }
            IndexState::Reading => {
                return Err(LabelIndexError::invalid_state(format!(
                    "index {} is open for reads and cannot be written",
                    self.name
                )));
            }
            IndexState::Closed | IndexState::Flushed => {}
        }

        *writer = Some(IndexWriter::new(self.storage.clone(), self.tokenizer.clone())?);
        *state = IndexState::Writing;
        debug!("index {}: write session opened", self.name);
        Ok(())
    }

    /// Append a document to the open write session.
    pub fn add(&self, document: Document) -> Result<()> {
        let mut writer = self.writer.lock();
        let writer = writer.as_mut().ok_or_else(|| {
            LabelIndexError::invalid_state(format!(
                "index {}: add() requires an open write session, call start_writes() first",
                self.name
            ))
        })?;
        writer.add_document(document)?;
        Ok(())
    }

    /// Commit and close the write session.
    pub fn stop_writes(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        let mut open = writer.take().ok_or_else(|| {
            LabelIndexError::invalid_state(format!(
                "index {}: stop_writes() without an open write session",
                self.name
            ))
        })?;

        let mut state = self.state.lock();
        if let Err(e) = open.close() {
            *state = IndexState::Closed;
            return Err(e);
        }
        *state = IndexState::Flushed;
        debug!("index {}: write session committed and closed", self.name);
        Ok(())
    }

    /// Discard the open write session, if any, without committing.
    pub fn abort_writes(&self) {
        let mut writer = self.writer.lock();
        if let Some(mut open) = writer.take() {
            if let Err(e) = open.rollback() {
                warn!("index {}: failed to roll back write session: {e}", self.name);
            }
            *self.state.lock() = IndexState::Closed;
            debug!("index {}: write session aborted", self.name);
        }
    }

    /// Open a read session over the latest commit.
    pub fn open_reads(&self) -> Result<()> {
        let _writer = self.writer.lock();
        let mut state = self.state.lock();
        if *state == IndexState::Writing {
            return Err(LabelIndexError::invalid_state(format!(
                "index {}: open_reads() while a write session is open",
                self.name
            )));
        }
        if !self.exists() {
            return Err(LabelIndexError::storage(format!(
                "index {}: no index found at storage location",
                self.name
            )));
        }

        let searcher = InvertedIndexSearcher::open(self.storage.as_ref())?;
        debug!(
            "index {}: read session opened over {} documents",
            self.name,
            searcher.doc_count()
        );
        *self.searcher.write() = Some(Arc::new(searcher));
        *state = IndexState::Reading;
        Ok(())
    }

    /// The open read session.
    pub fn searcher(&self) -> Result<Arc<dyn Searcher>> {
        self.searcher.read().clone().ok_or_else(|| {
            LabelIndexError::invalid_state(format!(
                "index {}: no read session, call open_reads() first",
                self.name
            ))
        })
    }

    /// Normalize text with the configured normalizer.
    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    /// Similarity of two normalized strings, in `[0, 1]`.
    pub fn distance(&self, a: &str, b: &str) -> f64 {
        self.distance.distance(a, b)
    }

    /// Parse a query string against the default field.
    pub fn parse(&self, query: &str) -> Result<Box<dyn Query>> {
        self.parser.parse(query)
    }

    #[cfg(test)]
    pub(crate) fn install_searcher(&self, searcher: Arc<dyn Searcher>) {
        *self.searcher.write() = Some(searcher);
        *self.state.lock() = IndexState::Reading;
    }
}
