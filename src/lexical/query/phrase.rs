//! Phrase query for matching consecutive terms.

use std::any::Any;

use ahash::{AHashMap, AHashSet};

use crate::error::Result;
use crate::lexical::query::scoring::Bm25;
use crate::lexical::query::{DocScores, Query, QueryKind};
use crate::lexical::reader::{DocPosting, IndexReader};

/// Matches documents in which the terms occur at consecutive positions.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseQuery {
    field: String,
    terms: Vec<String>,
    boost: f32,
}

impl PhraseQuery {
    pub fn new<F: Into<String>>(field: F, terms: Vec<String>) -> Self {
        PhraseQuery {
            field: field.into(),
            terms,
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

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Number of phrase occurrences in one document, given the postings of
    /// each phrase term in that document.
    fn phrase_freq(first: &DocPosting, rest: &[AHashSet<u32>]) -> u32 {
        first
            .positions
            .iter()
            .filter(|&&start| {
                rest.iter()
                    .enumerate()
                    .all(|(offset, positions)| positions.contains(&(start + offset as u32 + 1)))
            })
            .count() as u32
    }
}

impl Query for PhraseQuery {
    fn scores(&self, reader: &IndexReader) -> Result<DocScores> {
        let mut scores = DocScores::new();
        if self.terms.is_empty() {
            return Ok(scores);
        }
        let Some(field) = reader.field(&self.field) else {
            return Ok(scores);
        };

        let mut term_postings = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            match field.postings(term) {
                Some(postings) => term_postings.push(postings),
                None => return Ok(scores),
            }
        }

        let by_doc: Vec<AHashMap<u64, &DocPosting>> = term_postings[1..]
            .iter()
            .map(|postings| postings.iter().map(|p| (p.doc_id, p)).collect())
            .collect();

        let mut matches = Vec::new();
        for first in term_postings[0] {
            let mut rest: Vec<AHashSet<u32>> = Vec::with_capacity(by_doc.len());
            for postings in &by_doc {
                match postings.get(&first.doc_id) {
                    Some(posting) => rest.push(posting.positions.iter().copied().collect()),
                    None => break,
                }
            }
            if rest.len() != by_doc.len() {
                continue;
            }
            let freq = Self::phrase_freq(first, &rest);
            if freq > 0 {
                matches.push((first.doc_id, freq));
            }
        }

        let bm25 = Bm25::default();
        let average_length = field.average_length();
        let doc_freq = matches.len() as u64;
        for (doc_id, freq) in matches {
            let field_length = field.field_length(doc_id);
            let score: f32 = self
                .terms
                .iter()
                .map(|_| {
                    bm25.score(freq, field_length, average_length, doc_freq, reader.doc_count())
                })
                .sum();
            scores.insert(doc_id, score * self.boost);
        }
        Ok(scores)
    }

    fn kind(&self) -> QueryKind {
        QueryKind::Phrase
    }

    fn description(&self) -> String {
        format!(
            "PhraseQuery(field: {}, terms: \"{}\")",
            self.field,
            self.terms.join(" ")
        )
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
