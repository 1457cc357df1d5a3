//! Loosely-typed field sets submitted by clients
//!
//! Request bodies arrive as JSON objects or HTML form posts. Both are normalized
//! into [`Fields`] before validation.

use serde_json::{Map, Value};

/// Key carrying the issue ID in update and delete requests
pub const ID_KEY: &str = "_id";

/// Text form of a scalar value
///
/// Strings pass through; numbers and booleans use their JSON spelling.
/// Arrays, objects and null have no text form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whether a value counts as "not sent": null, `false`, zero or `""`
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// A set of named fields from a request body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Text value of a field that was actually sent
    ///
    /// Absent fields, blank scalars (`""`, `false`, `0`, null) and non-scalar
    /// values all yield `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .filter(|v| !is_blank(v))
            .and_then(scalar_text)
    }

    /// The `_id` field, if one was supplied
    pub fn id(&self) -> Option<String> {
        self.text(ID_KEY)
    }

    /// All fields other than `_id`
    pub fn without_id(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(k, _)| k.as_str() != ID_KEY)
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, String)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        )
    }
}
