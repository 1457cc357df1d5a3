//! Partial updates to a stored issue
//!
//! Only the fields named by [`FieldChange`] can be changed. `_id`, `project`
//! and `created_on` have no variant, so no request can overwrite them.

use super::{Fields, Issue, TextField};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Errors building a patch from request fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Parse the `open` flag from its text form
pub(crate) fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// One field assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Text(TextField, String),
    Open(bool),
}

impl FieldChange {
    /// Storage column touched by this change
    pub fn column(&self) -> &'static str {
        match self {
            FieldChange::Text(field, _) => field.name(),
            FieldChange::Open(_) => "open",
        }
    }

    pub fn apply(&self, issue: &mut Issue) {
        match self {
            FieldChange::Text(field, value) => field.set(issue, value.clone()),
            FieldChange::Open(open) => issue.open = *open,
        }
    }

    /// Build a change from one request field
    ///
    /// Returns `Ok(None)` for keys that are not updatable. An empty value for a
    /// required field is treated as "not sent"; optional fields may be cleared.
    fn from_field(key: &str, value: &Value) -> Result<Option<Self>, PatchError> {
        let invalid = || PatchError::InvalidValue {
            field: key.to_string(),
            value: value.to_string(),
        };

        if key == "open" {
            return match value {
                Value::Bool(b) => Ok(Some(FieldChange::Open(*b))),
                Value::String(s) if s.is_empty() => Ok(None),
                Value::String(s) => parse_flag(s)
                    .map(|b| Some(FieldChange::Open(b)))
                    .ok_or_else(invalid),
                Value::Null => Ok(None),
                _ => Err(invalid()),
            };
        }

        let Some(field) = TextField::from_name(key) else {
            return Ok(None);
        };
        match value {
            Value::Null => Ok(None),
            _ => {
                let text = super::fields::scalar_text(value).ok_or_else(invalid)?;
                if text.is_empty() && field.is_required() {
                    return Ok(None);
                }
                Ok(Some(FieldChange::Text(field, text)))
            }
        }
    }
}

/// A set of field changes plus the new `updated_on` stamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuePatch {
    changes: Vec<FieldChange>,
    updated_on: DateTime<Utc>,
}

impl IssuePatch {
    pub fn new(updated_on: DateTime<Utc>) -> Self {
        Self {
            changes: Vec::new(),
            updated_on,
        }
    }

    /// Add a change, replacing an earlier change to the same field
    pub fn set(mut self, change: FieldChange) -> Self {
        self.changes.retain(|c| c.column() != change.column());
        self.changes.push(change);
        self
    }

    /// Collect the updatable fields of a request, ignoring `_id` and unknown keys
    pub fn from_fields(fields: &Fields, updated_on: DateTime<Utc>) -> Result<Self, PatchError> {
        let mut patch = Self::new(updated_on);
        for (key, value) in fields.without_id() {
            match FieldChange::from_field(key, value)? {
                Some(change) => patch = patch.set(change),
                None => tracing::debug!(field = key, "Ignoring non-updatable or empty field"),
            }
        }
        Ok(patch)
    }

    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    pub fn updated_on(&self) -> DateTime<Utc> {
        self.updated_on
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Apply every change and refresh `updated_on`
    pub fn apply_to(&self, issue: &mut Issue) {
        for change in &self.changes {
            change.apply(issue);
        }
        issue.updated_on = self.updated_on;
    }
}
