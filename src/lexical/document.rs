//! Documents with multi-valued, typed fields.

use serde::{Deserialize, Serialize};

/// How a field value is indexed and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Whether the value is searchable.
    pub indexed: bool,
    /// Whether the value is split into word tokens. Untokenized values are
    /// indexed as a single term.
    pub tokenized: bool,
    /// Whether the value can be read back from a search hit.
    pub stored: bool,
}

impl FieldOption {
    /// Indexed as one exact term, and stored.
    pub const fn keyword() -> Self {
        FieldOption {
            indexed: true,
            tokenized: false,
            stored: true,
        }
    }

    /// Indexed as word tokens with positions, and stored.
    pub const fn text() -> Self {
        FieldOption {
            indexed: true,
            tokenized: true,
            stored: true,
        }
    }

    /// Stored for retrieval only.
    pub const fn stored_only() -> Self {
        FieldOption {
            indexed: false,
            tokenized: false,
            stored: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub option: FieldOption,
}

/// A document is an ordered list of fields. A field name may repeat, which
/// makes the field multi-valued.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Self {
        Document { fields: Vec::new() }
    }

    /// Add a field value in builder style.
    pub fn with_field<N: Into<String>, V: Into<String>>(
        mut self,
        name: N,
        value: V,
        option: FieldOption,
    ) -> Self {
        self.add_field(name, value, option);
        self
    }

    pub fn add_field<N: Into<String>, V: Into<String>>(
        &mut self,
        name: N,
        value: V,
        option: FieldOption,
    ) {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
            option,
        });
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// All values of a field, in insertion order.
    pub fn get_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |field| field.name == name)
            .map(|field| field.value.as_str())
    }

    /// The first value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_valued_fields() {
        let doc = Document::new()
            .with_field("uri", "u1", FieldOption::keyword())
            .with_field("label", "Water", FieldOption::stored_only())
            .with_field("label", "Water supply", FieldOption::stored_only());

        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get("uri"), Some("u1"));
        assert_eq!(
            doc.get_values("label").collect::<Vec<_>>(),
            vec!["Water", "Water supply"]
        );
        assert_eq!(doc.get("missing"), None);
    }

    #[test]
    fn test_value_outlives_field_name() {
        let doc = Document::new().with_field("uri", "u1", FieldOption::keyword());
        let value = {
            let name = String::from("uri");
            doc.get(&name)
        };
        assert_eq!(value, Some("u1"));
    }
}
