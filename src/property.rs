//! Semantic properties whose labels are indexed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of the readable part of a storage key.
const MAX_KEY_NAME_LENGTH: usize = 48;

/// A semantic property, identified by its URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentProperty {
    uri: String,
}

impl ComponentProperty {
    pub fn new<S: Into<String>>(uri: S) -> Self {
        ComponentProperty { uri: uri.into() }
    }

    /// Get the property URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The part of the URI after the last `#` or `/`, or the whole URI when
    /// that part is empty.
    pub fn local_name(&self) -> &str {
        let trimmed = self.uri.trim_end_matches(['/', '#']);
        match trimmed.rfind(['/', '#']) {
            Some(pos) if pos + 1 < trimmed.len() => &trimmed[pos + 1..],
            _ => &self.uri,
        }
    }

    /// File system safe name of the property's storage location.
    ///
    /// Made of the sanitized local name and a CRC-32 of the full URI, so two
    /// properties sharing a local name never share a location, and the key
    /// is the same in every process.
    pub fn storage_key(&self) -> String {
        let name: String = self
            .local_name()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .take(MAX_KEY_NAME_LENGTH)
            .collect();
        format!("{name}-{:08x}", crc32fast::hash(self.uri.as_bytes()))
    }
}

impl fmt::Display for ComponentProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl From<&str> for ComponentProperty {
    fn from(uri: &str) -> Self {
        ComponentProperty::new(uri)
    }
}
