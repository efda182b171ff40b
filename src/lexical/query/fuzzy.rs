//! Fuzzy query for approximate term matching.

use std::any::Any;

use fst::automaton::Levenshtein;
use fst::{IntoStreamer, Streamer};
use log::debug;

use crate::error::Result;
use crate::lexical::query::scoring::Bm25;
use crate::lexical::query::{DocScores, Query, QueryKind};
use crate::lexical::reader::{FieldIndex, IndexReader};

/// Upper bound on Levenshtein automaton states. Long query terms can exceed
/// it, in which case the dictionary is scanned instead.
const AUTOMATON_STATE_LIMIT: usize = 10_000;

/// Matches terms within a maximum edit distance of the query term.
///
/// Matching terms are expanded from the field's term dictionary, scored with
/// BM25 and weighted by their similarity to the query term. A document
/// matching several expanded terms keeps its best score.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyQuery {
    field: String,
    term: String,
    /// Maximum Levenshtein distance.
    max_edits: u32,
    /// Number of leading characters that must match exactly.
    prefix_length: u32,
    /// Maximum number of dictionary terms the query expands to. Closest
    /// terms are kept first.
    max_expansions: usize,
    boost: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Expansion {
    term: String,
    ordinal: u64,
    edits: u32,
}

impl FuzzyQuery {
    pub fn new<F: Into<String>, T: Into<String>>(field: F, term: T) -> Self {
        FuzzyQuery {
            field: field.into(),
            term: term.into(),
            max_edits: 2,
            prefix_length: 0,
            max_expansions: 50,
            boost: 1.0,
        }
    }

    pub fn max_edits(mut self, max_edits: u32) -> Self {
        self.max_edits = max_edits;
        self
    }

    pub fn prefix_length(mut self, prefix_length: u32) -> Self {
        self.prefix_length = prefix_length;
        self
    }

    pub fn max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
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

    pub fn get_max_edits(&self) -> u32 {
        self.max_edits
    }

    pub fn get_prefix_length(&self) -> u32 {
        self.prefix_length
    }

    pub fn get_max_expansions(&self) -> usize {
        self.max_expansions
    }

    fn expand(&self, field: &FieldIndex) -> Vec<Expansion> {
        let mut expansions = match Levenshtein::new_with_limit(
            &self.term,
            self.max_edits,
            AUTOMATON_STATE_LIMIT,
        ) {
            Ok(automaton) => {
                self.collect_expansions(field.dictionary().search(automaton).into_stream())
            }
            Err(e) => {
                debug!("fuzzy term {:?} falls back to dictionary scan: {e}", self.term);
                self.collect_expansions(field.dictionary().stream())
            }
        };

        expansions.sort_by(|a, b| a.edits.cmp(&b.edits).then_with(|| a.term.cmp(&b.term)));
        expansions.truncate(self.max_expansions);
        expansions
    }

    fn collect_expansions<S>(&self, mut stream: S) -> Vec<Expansion>
    where
        S: for<'a> Streamer<'a, Item = (&'a [u8], u64)>,
    {
        let prefix: String = self.term.chars().take(self.prefix_length as usize).collect();
        let term_length = self.term.chars().count();

        let mut expansions = Vec::new();
        while let Some((key, ordinal)) = stream.next() {
            let Ok(candidate) = std::str::from_utf8(key) else {
                continue;
            };
            if !candidate.starts_with(&prefix)
                || candidate.chars().count().abs_diff(term_length) > self.max_edits as usize
            {
                continue;
            }
            let edits = strsim::levenshtein(&self.term, candidate) as u32;
            if edits <= self.max_edits {
                expansions.push(Expansion {
                    term: candidate.to_string(),
                    ordinal,
                    edits,
                });
            }
        }
        expansions
    }

    fn similarity(&self, expansion: &Expansion) -> f32 {
        let longest = self.term.chars().count().max(expansion.term.chars().count());
        if longest == 0 {
            return 1.0;
        }
        1.0 - expansion.edits as f32 / longest as f32
    }
}

impl Query for FuzzyQuery {
    fn scores(&self, reader: &IndexReader) -> Result<DocScores> {
        let mut scores = DocScores::new();
        if self.term.is_empty() {
            return Ok(scores);
        }
        let Some(field) = reader.field(&self.field) else {
            return Ok(scores);
        };

        let bm25 = Bm25::default();
        let average_length = field.average_length();
        for expansion in self.expand(field) {
            let Some(postings) = field.postings_by_ordinal(expansion.ordinal) else {
                continue;
            };
            let similarity = self.similarity(&expansion);
            let doc_freq = postings.len() as u64;
            for posting in postings {
                let score = bm25.score(
                    posting.term_freq(),
                    field.field_length(posting.doc_id),
                    average_length,
                    doc_freq,
                    reader.doc_count(),
                ) * similarity
                    * self.boost;
                let best = scores.entry(posting.doc_id).or_insert(score);
                if score > *best {
                    *best = score;
                }
            }
        }
        Ok(scores)
    }

    fn kind(&self) -> QueryKind {
        QueryKind::Fuzzy
    }

    fn description(&self) -> String {
        format!(
            "FuzzyQuery(field: {}, term: {}, max_edits: {}, prefix: {})",
            self.field, self.term, self.max_edits, self.prefix_length
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
