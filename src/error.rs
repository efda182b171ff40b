//! Error types for the label index.
//!
//! Every fallible operation in the crate returns [`Result`], whose error
//! variant is [`LabelIndexError`]. Errors are never swallowed internally;
//! they are propagated to the caller unchanged.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LabelIndexError>;

/// The error type for index construction and lookup.
#[derive(Error, Debug)]
pub enum LabelIndexError {
    /// An operation was invoked in a lifecycle state that does not allow it,
    /// e.g. `add()` without an open write session or a lookup before
    /// `open_reads()`.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The storage location is unusable, missing or corrupt.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A query string could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error raised by a storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error raised while reading or writing index files.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LabelIndexError {
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        LabelIndexError::InvalidState(msg.into())
    }

    pub fn storage<S: Into<String>>(msg: S) -> Self {
        LabelIndexError::Storage(msg.into())
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        LabelIndexError::Parse(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        LabelIndexError::InvalidConfig(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LabelIndexError::InvalidArgument(msg.into())
    }

    /// Whether this error originates from the storage layer.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            LabelIndexError::Storage(_) | LabelIndexError::Io(_) | LabelIndexError::Json(_)
        )
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, LabelIndexError::InvalidState(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, LabelIndexError::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(LabelIndexError::storage("gone").is_storage());
        assert!(LabelIndexError::from(std::io::Error::other("disk")).is_storage());
        assert!(LabelIndexError::invalid_state("no writer").is_invalid_state());
        assert!(LabelIndexError::parse("dangling quote").is_parse());
        assert!(!LabelIndexError::parse("x").is_storage());
    }

    #[test]
    fn test_error_display() {
        let err = LabelIndexError::invalid_state("call start_writes() first");
        assert_eq!(err.to_string(), "Invalid state: call start_writes() first");
    }
}
