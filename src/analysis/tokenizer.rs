//! Word tokenization for tokenized label fields and query terms.

use std::fmt::Debug;

use unicode_segmentation::UnicodeSegmentation;

/// A token with its position in the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: u32,
}

impl Token {
    pub fn new<S: Into<String>>(text: S, position: u32) -> Self {
        Token {
            text: text.into(),
            position,
        }
    }
}

pub trait Tokenizer: Send + Sync + Debug {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &'static str;
}

/// Splits on Unicode word boundaries (UAX #29) and lowercases each word.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    pub fn new() -> Self {
        WordTokenizer
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        text.unicode_words()
            .enumerate()
            .map(|(position, word)| Token::new(word.to_lowercase(), position as u32))
            .collect()
    }

    fn name(&self) -> &'static str {
        "word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokenizer() {
        let tokens = WordTokenizer::new().tokenize("Drinking water, supply!");
        assert_eq!(
            tokens,
            vec![
                Token::new("drinking", 0),
                Token::new("water", 1),
                Token::new("supply", 2),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(WordTokenizer::new().tokenize("  -- ").is_empty());
    }
}
