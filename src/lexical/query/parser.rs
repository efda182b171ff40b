//! Query string parser.
//!
//! Turns a query string into a [`Query`] tree. Words are analyzed with the
//! same tokenizer used at index time, so a parsed query matches the terms
//! the writer produced for tokenized fields.

use std::sync::Arc;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::analysis::tokenizer::{Tokenizer, WordTokenizer};
use crate::error::{LabelIndexError, Result};
use crate::lexical::query::Query;
use crate::lexical::query::boolean::{BooleanClause, BooleanQuery, Occur};
use crate::lexical::query::phrase::PhraseQuery;
use crate::lexical::query::term::TermQuery;

#[derive(Parser)]
#[grammar = "lexical/query/parser.pest"]
struct QueryStringParser;

/// Parser for the lexical query syntax.
///
/// # Supported Syntax
///
/// - `water supply`: either word, on the default field
/// - `"water supply"`: both words at consecutive positions
/// - `+water -tower`: required and prohibited clauses
/// - `text_label:water`: explicit field
/// - `water^2.5`: boosted clause
///
/// # Example
///
/// ```
/// use label_index::lexical::{Query, QueryParser};
///
/// let parser = QueryParser::new("text_label");
/// let query = parser.parse("water supply").unwrap();
/// assert!(query.description().contains("water"));
/// ```
#[derive(Debug, Clone)]
pub struct QueryParser {
    default_field: String,
    tokenizer: Arc<dyn Tokenizer>,
}

impl QueryParser {
    pub fn new<F: Into<String>>(default_field: F) -> Self {
        QueryParser {
            default_field: default_field.into(),
            tokenizer: Arc::new(WordTokenizer::new()),
        }
    }

    /// Use a tokenizer other than [`WordTokenizer`] for query words.
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    pub fn parse(&self, query_str: &str) -> Result<Box<dyn Query>> {
        let pairs = QueryStringParser::parse(Rule::query, query_str)
            .map_err(|e| LabelIndexError::parse(format!("failed to parse query: {e}")))?;

        let mut clauses = Vec::new();
        for pair in pairs {
            if pair.as_rule() == Rule::query {
                for inner in pair.into_inner() {
                    if inner.as_rule() == Rule::clause {
                        if let Some(clause) = self.parse_clause(inner)? {
                            clauses.push(clause);
                        }
                    }
                }
            }
        }

        if clauses.is_empty() {
            return Err(LabelIndexError::parse(format!(
                "query {query_str:?} contains no searchable terms"
            )));
        }

        if clauses.len() == 1 && clauses[0].occur != Occur::MustNot {
            if let Some(clause) = clauses.pop() {
                return Ok(clause.query);
            }
        }

        let mut query = BooleanQuery::new();
        for clause in clauses {
            query.add_clause(clause);
        }
        Ok(Box::new(query))
    }

    /// Parse one clause. Returns `None` when the clause analyzes to no terms.
    fn parse_clause(&self, pair: Pair<Rule>) -> Result<Option<BooleanClause>> {
        let mut occur = Occur::Should;
        let mut field = self.default_field.clone();
        let mut query: Option<Box<dyn Query>> = None;
        let mut boost: Option<f32> = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::occur => {
                    occur = if inner.as_str() == "+" {
                        Occur::Must
                    } else {
                        Occur::MustNot
                    };
                }
                Rule::field_prefix => {
                    for fp_inner in inner.into_inner() {
                        if fp_inner.as_rule() == Rule::field_name {
                            field = fp_inner.as_str().to_string();
                        }
                    }
                }
                Rule::term => query = self.word_query(&field, inner.as_str()),
                Rule::phrase => {
                    for phrase_inner in inner.into_inner() {
                        if phrase_inner.as_rule() == Rule::phrase_text {
                            query = self.phrase_query(&field, phrase_inner.as_str());
                        }
                    }
                }
                Rule::boost => {
                    for b_inner in inner.into_inner() {
                        if b_inner.as_rule() == Rule::float_value {
                            let value = b_inner.as_str().parse::<f32>().map_err(|e| {
                                LabelIndexError::parse(format!("invalid boost value: {e}"))
                            })?;
                            boost = Some(value);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(query.map(|mut query| {
            if let Some(boost) = boost {
                query.set_boost(boost);
            }
            BooleanClause::new(query, occur)
        }))
    }

    fn analyze(&self, text: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .map(|token| token.text)
            .collect()
    }

    /// A bare word may analyze to several terms, e.g. `e-mail`. Any of them
    /// may match.
    fn word_query(&self, field: &str, text: &str) -> Option<Box<dyn Query>> {
        let mut terms = self.analyze(text);
        match terms.len() {
            0 => None,
            1 => terms
                .pop()
                .map(|term| Box::new(TermQuery::new(field, term)) as Box<dyn Query>),
            _ => {
                let mut query = BooleanQuery::new();
                for term in terms {
                    query = query.should(Box::new(TermQuery::new(field, term)));
                }
                Some(Box::new(query))
            }
        }
    }

    fn phrase_query(&self, field: &str, text: &str) -> Option<Box<dyn Query>> {
        let mut terms = self.analyze(text);
        match terms.len() {
            0 => None,
            1 => terms
                .pop()
                .map(|term| Box::new(TermQuery::new(field, term)) as Box<dyn Query>),
            _ => Some(Box::new(PhraseQuery::new(field, terms))),
        }
    }
}
