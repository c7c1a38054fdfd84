//! Composite values with declared fields and extension data.

use crate::{Value, ValueMap};

/// One declared field of a [`Record`].
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
    /// Omit the field when its value is null.
    pub skip_if_null: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
            skip_if_null: false,
        }
    }
}

/// A composite: declared fields in declaration order, plus an optional
/// extension map whose entries are written into the same object after the
/// fields.
///
/// # Examples
///
/// ```rust
/// use serde_walk::{to_string, Record, Value, ValueMap};
///
/// let mut extra = ValueMap::new();
/// extra.insert("x".to_string(), Value::from(1));
///
/// let record = Record::new()
///     .with_field("id", 7)
///     .with_optional_field("note", Value::Null)
///     .with_extension(extra);
///
/// assert_eq!(to_string(&Value::from(record)).unwrap(), r#"{"id":7,"x":1}"#);
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Record {
    fields: Vec<Field>,
    extension: Option<ValueMap>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(Field::new(name, value));
        self
    }

    /// Adds a field that is left out of the output while it is null.
    #[must_use]
    pub fn with_optional_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut field = Field::new(name, value);
        field.skip_if_null = true;
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: ValueMap) -> Self {
        self.extension = Some(extension);
        self
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn set_extension(&mut self, extension: Option<ValueMap>) {
        self.extension = extension;
    }

    /// Returns the first field named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn extension(&self) -> Option<&ValueMap> {
        self.extension.as_ref()
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
