//! Text analysis: label normalization and word tokenization.
//!
//! The same [`Normalizer`] is applied to labels at build time and to query
//! phrases at lookup time, so stored and queried forms never diverge.

pub mod normalizer;
pub mod tokenizer;

pub use normalizer::{Normalizer, StandardNormalizer};
pub use tokenizer::{Token, Tokenizer, WordTokenizer};
