//! Issue gateway
//!
//! Validates client input, turns it into store operations and reports the
//! outcome. HTTP concerns live in [`crate::server`]; this module only decides
//! *what* happened.
//!
//! Validation failures and unknown IDs are ordinary outcomes, not errors.
//! Only storage faults on list and create surface as `Err`. Storage faults
//! during update and delete are folded into the "could not" outcomes.

use crate::issue::{now, Fields, Issue, IssueFilter, IssueId, IssuePatch, NewIssue, TextField};
use crate::storage::IssueStore;
use crate::Result;
use std::sync::Arc;

/// Result of a create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Issue),
    MissingFields,
}

/// Result of an update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    MissingId,
    NoFields { id: String },
    NotUpdated { id: String },
    Updated { id: String },
}

/// Result of a delete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    MissingId,
    NotDeleted { id: String },
    Deleted { id: String },
}

/// Front door to an issue store
#[derive(Clone)]
pub struct IssueGateway {
    store: Arc<dyn IssueStore>,
}

impl IssueGateway {
    pub fn new(store: Arc<dyn IssueStore>) -> Self {
        Self { store }
    }

    /// List issues in a project matching every query parameter
    ///
    /// A parameter value that can never match (e.g. `open=maybe`) yields an
    /// empty list.
    pub async fn list<'a>(
        &self,
        project: &str,
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Vec<Issue>> {
        let filter = match IssueFilter::from_query(project, params) {
            Ok(filter) => filter,
            Err(e) => {
                tracing::debug!(project, error = %e, "Filter cannot match any issue");
                return Ok(Vec::new());
            }
        };

        let issues = self.store.find(&filter).await.inspect_err(|e| {
            tracing::error!(project, error = %e, "Failed to list issues");
        })?;

        tracing::info!(project, count = issues.len(), "Listed issues");
        Ok(issues)
    }

    /// Create an issue in a project
    pub async fn create(&self, project: &str, fields: &Fields) -> Result<CreateOutcome> {
        let required = |field: TextField| fields.text(field.name());
        let (Some(issue_title), Some(issue_text), Some(created_by)) = (
            required(TextField::IssueTitle),
            required(TextField::IssueText),
            required(TextField::CreatedBy),
        ) else {
            tracing::info!(project, "Rejected issue with missing required fields");
            return Ok(CreateOutcome::MissingFields);
        };

        let new_issue = NewIssue {
            project: project.to_string(),
            issue_title,
            issue_text,
            created_by,
            assigned_to: fields.text(TextField::AssignedTo.name()).unwrap_or_default(),
            status_text: fields.text(TextField::StatusText.name()).unwrap_or_default(),
            created_on: now(),
        };

        let issue = self.store.insert(new_issue).await.inspect_err(|e| {
            tracing::error!(project, error = %e, "Failed to create issue");
        })?;

        tracing::info!(project, issue_id = %issue.id, "Created issue");
        Ok(CreateOutcome::Created(issue))
    }

    /// Apply a partial update to the issue named by `_id`
    pub async fn update(&self, fields: &Fields) -> UpdateOutcome {
        let Some(id) = fields.id() else {
            return UpdateOutcome::MissingId;
        };

        let patch = match IssuePatch::from_fields(fields, now()) {
            Ok(patch) if patch.is_empty() => return UpdateOutcome::NoFields { id },
            Ok(patch) => patch,
            Err(e) => {
                tracing::info!(issue_id = %id, error = %e, "Rejected update");
                return UpdateOutcome::NotUpdated { id };
            }
        };

        let Some(issue_id) = IssueId::parse(&id) else {
            tracing::info!(issue_id = %id, "Update for malformed id");
            return UpdateOutcome::NotUpdated { id };
        };

        match self.store.update_by_id(&issue_id, &patch).await {
            Ok(Some(_)) => {
                tracing::info!(
                    issue_id = %id,
                    fields = patch.changes().len(),
                    "Updated issue"
                );
                UpdateOutcome::Updated { id }
            }
            Ok(None) => {
                tracing::info!(issue_id = %id, "Update for unknown issue");
                UpdateOutcome::NotUpdated { id }
            }
            Err(e) => {
                tracing::warn!(issue_id = %id, error = %e, "Update failed in storage");
                UpdateOutcome::NotUpdated { id }
            }
        }
    }

    /// Delete the issue named by `_id`
    pub async fn delete(&self, fields: &Fields) -> DeleteOutcome {
        let Some(id) = fields.id() else {
            return DeleteOutcome::MissingId;
        };

        let Some(issue_id) = IssueId::parse(&id) else {
            tracing::info!(issue_id = %id, "Delete for malformed id");
            return DeleteOutcome::NotDeleted { id };
        };

        match self.store.delete_by_id(&issue_id).await {
            Ok(Some(issue)) => {
                tracing::info!(issue_id = %id, project = %issue.project, "Deleted issue");
                DeleteOutcome::Deleted { id }
            }
            Ok(None) => {
                tracing::info!(issue_id = %id, "Delete for unknown issue");
                DeleteOutcome::NotDeleted { id }
            }
            Err(e) => {
                tracing::warn!(issue_id = %id, error = %e, "Delete failed in storage");
                DeleteOutcome::NotDeleted { id }
            }
        }
    }
}
