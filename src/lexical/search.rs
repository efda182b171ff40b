//! Searching a committed index.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt::Debug;
use std::sync::Arc;

use log::trace;

use crate::error::{LabelIndexError, Result};
use crate::lexical::query::Query;
use crate::lexical::reader::IndexReader;
use crate::storage::Storage;

/// A scored document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub doc_id: u64,
    pub score: f32,
}

/// Read access to a committed index.
pub trait Searcher: Send + Sync + Debug {
    /// The `limit` highest scoring documents, best first. Ties go to the
    /// lower document ID.
    fn search(&self, query: &dyn Query, limit: usize) -> Result<Vec<SearchHit>>;

    /// Stored values of `field` in a hit's document.
    fn stored_values(&self, doc_id: u64, field: &str) -> Result<Vec<String>>;

    fn doc_count(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ranked(SearchHit);

impl Eq for Ranked {}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .score
            .total_cmp(&other.0.score)
            .then_with(|| other.0.doc_id.cmp(&self.0.doc_id))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// [`Searcher`] over the in-memory view of all committed segments.
#[derive(Debug, Clone)]
pub struct InvertedIndexSearcher {
    reader: Arc<IndexReader>,
}

impl InvertedIndexSearcher {
    pub fn new(reader: Arc<IndexReader>) -> Self {
        InvertedIndexSearcher { reader }
    }

    pub fn open(storage: &dyn Storage) -> Result<Self> {
        Ok(Self::new(Arc::new(IndexReader::open(storage)?)))
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }
}

impl Searcher for InvertedIndexSearcher {
    fn search(&self, query: &dyn Query, limit: usize) -> Result<Vec<SearchHit>> {
        if limit == 0 {
            return Err(LabelIndexError::invalid_argument(
                "search limit must be greater than zero",
            ));
        }

        let scores = query.scores(&self.reader)?;
        let mut heap = BinaryHeap::with_capacity(limit.saturating_add(1).min(scores.len() + 1));
        for (&doc_id, &score) in scores.iter() {
            heap.push(Reverse(Ranked(SearchHit { doc_id, score })));
            if heap.len() > limit {
                heap.pop();
            }
        }

        let hits: Vec<SearchHit> = heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(Ranked(hit))| hit)
            .collect();
        trace!(
            "{} matched {} documents, returning {}",
            query.description(),
            scores.len(),
            hits.len()
        );
        Ok(hits)
    }

    fn stored_values(&self, doc_id: u64, field: &str) -> Result<Vec<String>> {
        Ok(self.reader.stored_values(doc_id, field)?.to_vec())
    }

    fn doc_count(&self) -> u64 {
        self.reader.doc_count()
    }
}
