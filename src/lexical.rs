//! Inverted index used as the label search engine.
//!
//! This module provides a small, durable full-text index with the three
//! operations the label index needs:
//!
//! - a write session that appends documents with typed fields
//!   ([`IndexWriter`]),
//! - a read session that scores documents for a query and returns the top
//!   hits ([`Searcher`]),
//! - access to the stored field values of a hit.
//!
//! # Module Structure
//!
//! - `document`: documents and field options
//! - `segment`: on-disk format (segments and the `index.meta` commit point)
//! - `writer`: buffered writer producing one segment per commit
//! - `reader`: merged, in-memory view over all committed segments
//! - `query`: query types, BM25 scoring and the query string parser
//! - `search`: searcher trait and top-k collection

pub mod document;
pub mod query;
pub mod reader;
pub mod search;
pub mod segment;
pub mod writer;

pub use document::{Document, Field, FieldOption};
pub use query::boolean::{BooleanClause, BooleanQuery, Occur};
pub use query::fuzzy::FuzzyQuery;
pub use query::parser::QueryParser;
pub use query::phrase::PhraseQuery;
pub use query::term::TermQuery;
pub use query::{Query, QueryKind};
pub use reader::IndexReader;
pub use search::{InvertedIndexSearcher, SearchHit, Searcher};
pub use writer::IndexWriter;
