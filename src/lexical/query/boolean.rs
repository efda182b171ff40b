//! Boolean query implementation for combining multiple queries.

use std::any::Any;

use ahash::AHashSet;

use crate::error::Result;
use crate::lexical::query::{DocScores, Query, QueryKind};
use crate::lexical::reader::IndexReader;

/// Occurrence requirements for boolean clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// The clause must match (equivalent to AND).
    Must,
    /// The clause should match (equivalent to OR).
    Should,
    /// The clause must not match (equivalent to NOT).
    MustNot,
}

/// A clause in a boolean query.
#[derive(Debug)]
pub struct BooleanClause {
    pub query: Box<dyn Query>,
    pub occur: Occur,
}

impl Clone for BooleanClause {
    fn clone(&self) -> Self {
        BooleanClause {
            query: self.query.clone_box(),
            occur: self.occur,
        }
    }
}

impl BooleanClause {
    pub fn new(query: Box<dyn Query>, occur: Occur) -> Self {
        BooleanClause { query, occur }
    }

    pub fn must(query: Box<dyn Query>) -> Self {
        BooleanClause::new(query, Occur::Must)
    }

    pub fn should(query: Box<dyn Query>) -> Self {
        BooleanClause::new(query, Occur::Should)
    }

    pub fn must_not(query: Box<dyn Query>) -> Self {
        BooleanClause::new(query, Occur::MustNot)
    }
}

/// Combines clauses with AND, OR and NOT semantics.
///
/// When at least one `Must` clause is present, a document matches only if
/// every `Must` clause matches it, and `Should` clauses only add to its
/// score. Without `Must` clauses a document matches if any `Should` clause
/// matches it. Documents matched by a `MustNot` clause are always excluded,
/// and a query made only of `MustNot` clauses matches nothing.
#[derive(Debug, Clone)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
    boost: f32,
}

impl Default for BooleanQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl BooleanQuery {
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
            boost: 1.0,
        }
    }

    pub fn add_clause(&mut self, clause: BooleanClause) {
        self.clauses.push(clause);
    }

    pub fn must(mut self, query: Box<dyn Query>) -> Self {
        self.add_clause(BooleanClause::must(query));
        self
    }

    pub fn should(mut self, query: Box<dyn Query>) -> Self {
        self.add_clause(BooleanClause::should(query));
        self
    }

    pub fn must_not(mut self, query: Box<dyn Query>) -> Self {
        self.add_clause(BooleanClause::must_not(query));
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl Query for BooleanQuery {
    fn scores(&self, reader: &IndexReader) -> Result<DocScores> {
        let mut required: Option<DocScores> = None;
        let mut optional = Vec::new();
        let mut excluded = AHashSet::new();

        for clause in &self.clauses {
            let clause_scores = clause.query.scores(reader)?;
            match clause.occur {
                Occur::Must => {
                    required = Some(match required.take() {
                        None => clause_scores,
                        Some(mut acc) => {
                            acc.retain(|doc_id, _| clause_scores.contains_key(doc_id));
                            for (doc_id, score) in acc.iter_mut() {
                                *score += clause_scores[doc_id];
                            }
                            acc
                        }
                    });
                }
                Occur::Should => optional.push(clause_scores),
                Occur::MustNot => excluded.extend(clause_scores.keys().copied()),
            }
        }

        let mut scores = match required {
            Some(mut acc) => {
                for clause_scores in &optional {
                    for (doc_id, score) in acc.iter_mut() {
                        if let Some(extra) = clause_scores.get(doc_id) {
                            *score += extra;
                        }
                    }
                }
                acc
            }
            None => {
                let mut acc = DocScores::new();
                for clause_scores in optional {
                    for (&doc_id, &score) in clause_scores.iter() {
                        *acc.entry(doc_id).or_insert(0.0) += score;
                    }
                }
                acc
            }
        };

        scores.retain(|doc_id, _| !excluded.contains(doc_id));
        if self.boost != 1.0 {
            for score in scores.values_mut() {
                *score *= self.boost;
            }
        }
        Ok(scores)
    }

    fn kind(&self) -> QueryKind {
        QueryKind::Boolean
    }

    fn description(&self) -> String {
        let clauses: Vec<String> = self
            .clauses
            .iter()
            .map(|clause| {
                let prefix = match clause.occur {
                    Occur::Must => "+",
                    Occur::Should => "",
                    Occur::MustNot => "-",
                };
                format!("{prefix}{}", clause.query.description())
            })
            .collect();
        format!("BooleanQuery({})", clauses.join(" "))
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
    use crate::lexical::query::term::TermQuery;
    use crate::lexical::writer::IndexWriter;
    use crate::storage::Storage;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    fn reader() -> IndexReader {
        let storage: Arc<dyn Storage> =
            Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        let mut writer = IndexWriter::new(storage.clone(), Arc::new(WordTokenizer::new())).unwrap();
        for text in ["water supply", "water quality", "air quality"] {
            writer
                .add_document(Document::new().with_field("text", text, FieldOption::text()))
                .unwrap();
        }
        writer.close().unwrap();
        IndexReader::open(storage.as_ref()).unwrap()
    }

    fn term(text: &str) -> Box<dyn Query> {
        Box::new(TermQuery::new("text", text))
    }

    #[test]
    fn test_should_is_union() {
        let query = BooleanQuery::new().should(term("supply")).should(term("air"));
        let scores = query.scores(&reader()).unwrap();
        let mut docs: Vec<u64> = scores.keys().copied().collect();
        docs.sort();
        assert_eq!(docs, vec![0, 2]);
    }

    #[test]
    fn test_must_is_intersection_and_should_adds_score() {
        let reader = reader();
        let only_must = BooleanQuery::new().must(term("water")).scores(&reader).unwrap();
        let with_should = BooleanQuery::new()
            .must(term("water"))
            .should(term("quality"))
            .scores(&reader)
            .unwrap();

        assert_eq!(with_should.len(), 2);
        assert!(!with_should.contains_key(&2));
        assert!(with_should[&1] > only_must[&1]);
        assert_eq!(with_should[&0], only_must[&0]);
    }

    #[test]
    fn test_must_not_excludes() {
        let query = BooleanQuery::new()
            .should(term("quality"))
            .must_not(term("air"));
        let scores = query.scores(&reader()).unwrap();
        assert_eq!(scores.keys().copied().collect::<Vec<_>>(), vec![1]);

        let only_negative = BooleanQuery::new().must_not(term("air"));
        assert!(only_negative.scores(&reader()).unwrap().is_empty());
    }

    #[test]
    fn test_description() {
        let query = BooleanQuery::new().must(term("water")).must_not(term("air"));
        assert_eq!(
            query.description(),
            "BooleanQuery(+TermQuery(field: text, term: water) -TermQuery(field: text, term: air))"
        );
    }
}
