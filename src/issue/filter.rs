//! Field-equality filters for listing issues

use super::patch::parse_flag;
use super::record::parse_timestamp;
use super::{Issue, IssueId, TextField};
use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;

/// Errors building a filter from query parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// One equality constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    Id(IssueId),
    Text(TextField, String),
    Open(bool),
    CreatedOn(DateTime<Utc>),
    UpdatedOn(DateTime<Utc>),
}

impl Criterion {
    /// Build a criterion from a query parameter
    ///
    /// Timestamps are stored at millisecond precision, so finer query values are
    /// truncated to match. Unknown keys and `project` (which always comes from the path) yield `Ok(None)`.
    fn from_param(key: &str, value: &str) -> Result<Option<Self>, FilterError> {
        let invalid = || FilterError::InvalidValue {
            field: key.to_string(),
            value: value.to_string(),
        };

        let timestamp = || {
            parse_timestamp(value)
                .map(|ts| ts.trunc_subsecs(3))
                .ok_or_else(invalid)
        };

        let criterion = match key {
            "_id" => Criterion::Id(IssueId::parse(value).ok_or_else(invalid)?),
            "open" => Criterion::Open(parse_flag(value).ok_or_else(invalid)?),
            "created_on" => Criterion::CreatedOn(timestamp()?),
            "updated_on" => Criterion::UpdatedOn(timestamp()?),
            _ => match TextField::from_name(key) {
                Some(field) => Criterion::Text(field, value.to_string()),
                None => return Ok(None),
            },
        };
        Ok(Some(criterion))
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        match self {
            Criterion::Id(id) => &issue.id == id,
            Criterion::Text(field, value) => field.get(issue) == value,
            Criterion::Open(open) => issue.open == *open,
            Criterion::CreatedOn(ts) => issue.created_on == *ts,
            Criterion::UpdatedOn(ts) => issue.updated_on == *ts,
        }
    }
}

/// A project plus any number of field-equality criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    project: String,
    criteria: Vec<Criterion>,
}

impl IssueFilter {
    /// Match every issue in a project
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            criteria: Vec::new(),
        }
    }

    /// Add a criterion
    pub fn with(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Build a filter from a project and query parameters
    ///
    /// Parameters naming fields an issue does not have are skipped. A value that
    /// cannot match its field (e.g. `open=maybe`) is an error.
    pub fn from_query<'a>(
        project: impl Into<String>,
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, FilterError> {
        let mut filter = Self::for_project(project);
        for (key, value) in params {
            match Criterion::from_param(key, value)? {
                Some(criterion) => filter = filter.with(criterion),
                None => tracing::debug!(field = key, "Ignoring unknown filter field"),
            }
        }
        Ok(filter)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        issue.project == self.project && self.criteria.iter().all(|c| c.matches(issue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{now, NewIssue};

    fn issue(project: &str, created_by: &str, open: bool) -> Issue {
        let mut issue = NewIssue {
            project: project.to_string(),
            issue_title: "Title".to_string(),
            issue_text: "Text".to_string(),
            created_by: created_by.to_string(),
            assigned_to: String::new(),
            status_text: String::new(),
            created_on: now(),
        }
        .into_issue(IssueId::generate());
        issue.open = open;
        issue
    }

    #[test]
    fn test_project_only() {
        let filter = IssueFilter::for_project("apitest");
        assert!(filter.matches(&issue("apitest", "a", true)));
        assert!(!filter.matches(&issue("other", "a", true)));
    }

    #[test]
    fn test_from_query_multiple() {
        let filter = IssueFilter::from_query(
            "apitest",
            [("open", "true"), ("created_by", "Test Creator")],
        )
        .unwrap();

        assert_eq!(filter.criteria().len(), 2);
        assert!(filter.matches(&issue("apitest", "Test Creator", true)));
        assert!(!filter.matches(&issue("apitest", "Test Creator", false)));
        assert!(!filter.matches(&issue("apitest", "Someone", true)));
    }

    #[test]
    fn test_from_query_project_comes_from_path() {
        let filter = IssueFilter::from_query("apitest", [("project", "other")]).unwrap();
        assert_eq!(filter.project(), "apitest");
        assert!(filter.criteria().is_empty());
    }

    #[test]
    fn test_from_query_skips_unknown() {
        let filter = IssueFilter::from_query("apitest", [("$where", "1"), ("color", "red")]).unwrap();
        assert!(filter.criteria().is_empty());
    }

    #[test]
    fn test_from_query_rejects_bad_values() {
        assert!(IssueFilter::from_query("p", [("open", "yes")]).is_err());
        assert!(IssueFilter::from_query("p", [("_id", "invalidid123")]).is_err());
        assert!(IssueFilter::from_query("p", [("created_on", "yesterday")]).is_err());
    }

    #[test]
    fn test_timestamp_criterion() {
        let target = issue("apitest", "a", true);
        let stamp = crate::issue::format_timestamp(&target.created_on);
        let filter = IssueFilter::from_query("apitest", [("created_on", stamp.as_str())]).unwrap();
        assert!(filter.matches(&target));
    }

    #[test]
    fn test_timestamp_criterion_truncates_to_millis() {
        let mut target = issue("apitest", "a", true);
        target.created_on = crate::issue::parse_timestamp("2024-03-01T12:00:05.678Z").unwrap();

        let filter =
            IssueFilter::from_query("apitest", [("created_on", "2024-03-01T12:00:05.6789Z")])
                .unwrap();
        assert_eq!(
            filter.criteria(),
            &[Criterion::CreatedOn(target.created_on)]
        );
        assert!(filter.matches(&target));
    }
}
