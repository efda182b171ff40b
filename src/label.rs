//! Per-property label index.
//!
//! A [`LabelIndex`] stores the labels of a set of URIs and answers
//! "which URIs are labelled like this phrase?". Search hits are re-scored
//! with the configured [`StringDistance`](crate::distance::StringDistance)
//! between the normalized query and each stored original label, so scores
//! are comparable across properties and bounded by `[0, 1]`.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::analysis::normalizer::Normalizer;
use crate::analysis::tokenizer::Tokenizer;
use crate::config::LabelIndexConfig;
use crate::distance::StringDistance;
use crate::error::Result;
use crate::index::{Index, IndexState};
use crate::lexical::document::{Document, FieldOption};
use crate::lexical::query::Query;
use crate::lexical::query::fuzzy::FuzzyQuery;
use crate::lexical::search::Searcher;
use crate::property::ComponentProperty;
use crate::storage::Storage;

/// Stored keyword holding the URI a document describes.
pub const URI_FIELD: &str = "uri";
/// Normalized label indexed as one term, searched by fuzzy queries.
pub const EXACT_FIELD: &str = "exact_label";
/// Normalized label indexed as words, searched by parsed queries.
pub const TEXT_FIELD: &str = "text_label";
/// Label as returned by the label function, stored only.
pub const ORIGINAL_FIELD: &str = "original_label";

/// URI to similarity score. Keys are unique and unordered; see
/// [`rank_by_score`] for a ranked view.
pub type ScoredUris = HashMap<String, f64>;

/// Sort lookup results by descending score, breaking ties by URI.
pub fn rank_by_score(scored: &ScoredUris) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = scored
        .iter()
        .map(|(uri, score)| (uri.clone(), *score))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked
}

/// Fuzzy label lookup for one [`ComponentProperty`].
///
/// Instances are created by [`IndexRegistry`](crate::IndexRegistry), which
/// keeps exactly one per property.
#[derive(Debug)]
pub struct LabelIndex {
    property: ComponentProperty,
    index: Index,
    config: LabelIndexConfig,
    build_lock: Mutex<()>,
}

impl LabelIndex {
    pub(crate) fn new(
        property: ComponentProperty,
        storage: Arc<dyn Storage>,
        config: LabelIndexConfig,
    ) -> Self {
        let index = Index::new(property.uri(), storage, TEXT_FIELD);
        LabelIndex {
            property,
            index,
            config,
            build_lock: Mutex::new(()),
        }
    }

    pub(crate) fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.index = self.index.with_normalizer(normalizer);
        self
    }

    pub(crate) fn with_distance(mut self, distance: Arc<dyn StringDistance>) -> Self {
        self.index = self.index.with_distance(distance);
        self
    }

    pub(crate) fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.index = self.index.with_tokenizer(tokenizer);
        self
    }

    /// Get the property whose labels this index holds.
    pub fn property(&self) -> &ComponentProperty {
        &self.property
    }

    /// Get the configuration the index was created with.
    pub fn config(&self) -> &LabelIndexConfig {
        &self.config
    }

    /// Whether the read session is open, i.e. whether [`LabelIndex::lookup`]
    /// can be served.
    pub fn is_readable(&self) -> bool {
        self.index.state() == IndexState::Reading
    }

    /// Build the index from `uris` unless it already exists, then open it
    /// for reads.
    ///
    /// `label_fn` is called once per URI, and only when the index is built.
    /// When a committed index is already present at the storage location,
    /// it is opened as is; when this instance is already readable, nothing
    /// happens. Concurrent calls are serialized.
    pub fn fill<I, S, F, L>(&self, uris: I, mut label_fn: F) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&str) -> L,
        L: IntoIterator<Item = String>,
    {
        let _guard = self.build_lock.lock();
        if self.is_readable() {
            return Ok(());
        }

        if self.index.exists() {
            debug!("label index {}: found existing index, skipping build", self.property);
        } else {
            debug!("label index {}: building", self.property);
            self.index.start_writes()?;
            let mut count = 0usize;
            for uri in uris {
                let uri = uri.as_ref();
                let labels: BTreeSet<String> = label_fn(uri).into_iter().collect();
                if let Err(e) = self.add(uri, labels) {
                    self.index.abort_writes();
                    return Err(e);
                }
                count += 1;
            }
            self.index.stop_writes()?;
            debug!("label index {}: indexed {count} uris", self.property);
        }

        self.index.open_reads()
    }

    /// Store one URI with its labels.
    ///
    /// Only valid while a write session is open, i.e. inside
    /// [`LabelIndex::fill`].
    pub fn add<S: AsRef<str>, I: IntoIterator<Item = S>>(&self, uri: &str, labels: I) -> Result<()> {
        let mut doc = Document::new().with_field(URI_FIELD, uri, FieldOption::keyword());
        for label in labels {
            let label = label.as_ref();
            let normalized = self.index.normalize(label);
            doc.add_field(EXACT_FIELD, normalized.clone(), FieldOption::keyword());
            doc.add_field(TEXT_FIELD, normalized, FieldOption::text());
            doc.add_field(ORIGINAL_FIELD, label, FieldOption::stored_only());
        }
        self.index.add(doc)
    }

    /// Score the URIs whose labels resemble `label`.
    ///
    /// Inputs that normalize to nothing yield an empty result without
    /// touching the index. Normalized inputs of at least
    /// `min_fuzzy_length` characters are first matched fuzzily against
    /// whole labels; every input is then matched word by word. Each hit
    /// scores the best similarity between the normalized input and the
    /// normalized forms of its original labels.
    ///
    /// A URI hit more than once keeps the score of its last hit, in rank
    /// order within a pass and with the word pass running last. A URI that
    /// scores high in the fuzzy pass can therefore end up with a lower
    /// score from the word pass.
    pub fn lookup(&self, label: &str) -> Result<ScoredUris> {
        let mut scored = ScoredUris::new();
        let normalized = self.index.normalize(label);
        if normalized.is_empty() {
            trace!("label index {}: {label:?} normalizes to nothing", self.property);
            return Ok(scored);
        }

        let searcher = self.index.searcher()?;
        if normalized.chars().count() >= self.config.min_fuzzy_length {
            let fuzzy = FuzzyQuery::new(EXACT_FIELD, normalized.as_str())
                .max_edits(self.config.fuzzy.max_edits)
                .prefix_length(self.config.fuzzy.prefix_length)
                .max_expansions(self.config.fuzzy.max_expansions);
            self.collect_hits(searcher.as_ref(), &fuzzy, &normalized, &mut scored)?;
        }

        let parsed = self.index.parse(&normalized)?;
        self.collect_hits(searcher.as_ref(), parsed.as_ref(), &normalized, &mut scored)?;
        Ok(scored)
    }

    fn collect_hits(
        &self,
        searcher: &dyn Searcher,
        query: &dyn Query,
        normalized: &str,
        scored: &mut ScoredUris,
    ) -> Result<()> {
        trace!("label index {}: query {}", self.property, query.description());
        for hit in searcher.search(query, self.config.top_k)? {
            let Some(uri) = searcher.stored_values(hit.doc_id, URI_FIELD)?.into_iter().next() else {
                continue;
            };
            let originals = searcher.stored_values(hit.doc_id, ORIGINAL_FIELD)?;
            trace!("label index {}: {uri} labelled {originals:?}", self.property);

            let score = originals
                .iter()
                .map(|original| self.index.distance(normalized, &self.index.normalize(original)))
                .fold(0.0, f64::max);
            scored.insert(uri, score);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn index(&self) -> &Index {
        &self.index
    }
}
