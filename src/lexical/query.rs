//! Query types for the inverted index.
//!
//! Every query computes a score for each matching document. Scores follow
//! BM25 and are only meaningful for ranking documents against each other
//! within one query.

pub mod boolean;
pub mod fuzzy;
pub mod parser;
pub mod phrase;
pub mod scoring;
pub mod term;

use std::any::Any;
use std::fmt::Debug;

use ahash::AHashMap;

use crate::error::Result;
use crate::lexical::reader::IndexReader;

/// Document ID to score.
pub type DocScores = AHashMap<u64, f32>;

/// Coarse classification of a query, for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Term,
    Fuzzy,
    Phrase,
    Boolean,
}

pub trait Query: Send + Sync + Debug {
    /// Score every matching document.
    fn scores(&self, reader: &IndexReader) -> Result<DocScores>;

    fn kind(&self) -> QueryKind;

    /// Human readable form, used in trace logs.
    fn description(&self) -> String;

    fn boost(&self) -> f32;

    fn set_boost(&mut self, boost: f32);

    fn clone_box(&self) -> Box<dyn Query>;

    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Query> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
