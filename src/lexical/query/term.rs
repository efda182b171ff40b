//! Exact term query.

use std::any::Any;

use crate::error::Result;
use crate::lexical::query::scoring::Bm25;
use crate::lexical::query::{DocScores, Query, QueryKind};
use crate::lexical::reader::IndexReader;

#[derive(Debug, Clone, PartialEq)]
pub struct TermQuery {
    field: String,
    term: String,
    boost: f32,
}

impl TermQuery {
    pub fn new<F: Into<String>, T: Into<String>>(field: F, term: T) -> Self {
        TermQuery {
            field: field.into(),
            term: term.into(),
            boost: 1.0,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

impl Query for TermQuery {
    fn scores(&self, reader: &IndexReader) -> Result<DocScores> {
        let mut scores = DocScores::new();
        let Some(field) = reader.field(&self.field) else {
            return Ok(scores);
        };
        let Some(postings) = field.postings(&self.term) else {
            return Ok(scores);
        };

        let bm25 = Bm25::default();
        let doc_freq = postings.len() as u64;
        let average_length = field.average_length();
        for posting in postings {
            let score = bm25.score(
                posting.term_freq(),
                field.field_length(posting.doc_id),
                average_length,
                doc_freq,
                reader.doc_count(),
            );
            scores.insert(posting.doc_id, score * self.boost);
        }
        Ok(scores)
    }

    fn kind(&self) -> QueryKind {
        QueryKind::Term
    }

    fn description(&self) -> String {
        format!("TermQuery(field: {}, term: {})", self.field, self.term)
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analysis::tokenizer::WordTokenizer;
    use crate::lexical::document::{Document, FieldOption};
    use crate::lexical::writer::IndexWriter;
    use crate::storage::Storage;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    #[test]
    fn test_shorter_field_scores_higher() {
        let storage: Arc<dyn Storage> =
            Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        let mut writer = IndexWriter::new(storage.clone(), Arc::new(WordTokenizer::new())).unwrap();
        for text in ["water", "water supply", "energy"] {
            writer
                .add_document(Document::new().with_field("text", text, FieldOption::text()))
                .unwrap();
        }
        writer.close().unwrap();
        let reader = IndexReader::open(storage.as_ref()).unwrap();

        let scores = TermQuery::new("text", "water").scores(&reader).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[&0] > scores[&1]);

        let boosted = TermQuery::new("text", "water")
            .with_boost(2.0)
            .scores(&reader)
            .unwrap();
        assert!((boosted[&0] - 2.0 * scores[&0]).abs() < 1e-6);

        assert!(TermQuery::new("missing", "water").scores(&reader).unwrap().is_empty());
        assert!(TermQuery::new("text", "air").scores(&reader).unwrap().is_empty());
    }
}
