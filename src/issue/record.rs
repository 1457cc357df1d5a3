//! Issue record
//!
//! The stored shape of an issue and the input used to create one.

use super::IssueId;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Current server time at the precision issues are stored with
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Canonical text form of a timestamp (RFC 3339, milliseconds, `Z` suffix)
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a timestamp in any RFC 3339 form
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}

/// A single tracked issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: IssueId,
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    #[serde(with = "timestamp")]
    pub created_on: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_on: DateTime<Utc>,
    pub created_by: String,
    pub assigned_to: String,
    pub open: bool,
    pub status_text: String,
}

/// Text fields a client may filter on or change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    IssueTitle,
    IssueText,
    CreatedBy,
    AssignedTo,
    StatusText,
}

impl TextField {
    pub const ALL: [TextField; 5] = [
        TextField::IssueTitle,
        TextField::IssueText,
        TextField::CreatedBy,
        TextField::AssignedTo,
        TextField::StatusText,
    ];

    /// Field name as it appears in requests, responses and storage
    pub fn name(self) -> &'static str {
        match self {
            TextField::IssueTitle => "issue_title",
            TextField::IssueText => "issue_text",
            TextField::CreatedBy => "created_by",
            TextField::AssignedTo => "assigned_to",
            TextField::StatusText => "status_text",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Whether the field must stay non-empty
    pub fn is_required(self) -> bool {
        matches!(
            self,
            TextField::IssueTitle | TextField::IssueText | TextField::CreatedBy
        )
    }

    pub fn get(self, issue: &Issue) -> &str {
        match self {
            TextField::IssueTitle => &issue.issue_title,
            TextField::IssueText => &issue.issue_text,
            TextField::CreatedBy => &issue.created_by,
            TextField::AssignedTo => &issue.assigned_to,
            TextField::StatusText => &issue.status_text,
        }
    }

    pub fn set(self, issue: &mut Issue, value: String) {
        let slot = match self {
            TextField::IssueTitle => &mut issue.issue_title,
            TextField::IssueText => &mut issue.issue_text,
            TextField::CreatedBy => &mut issue.created_by,
            TextField::AssignedTo => &mut issue.assigned_to,
            TextField::StatusText => &mut issue.status_text,
        };
        *slot = value;
    }
}

/// Validated input for creating an issue
///
/// Carries everything except the ID, which the store assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub created_on: DateTime<Utc>,
}

impl NewIssue {
    /// Materialize the record under the given ID
    ///
    /// New issues are open and have `updated_on == created_on`.
    pub fn into_issue(self, id: IssueId) -> Issue {
        Issue {
            id,
            project: self.project,
            issue_title: self.issue_title,
            issue_text: self.issue_text,
            created_on: self.created_on,
            updated_on: self.created_on,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            open: true,
            status_text: self.status_text,
        }
    }
}
