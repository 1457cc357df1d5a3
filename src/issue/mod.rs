//! Issue data model
//!
//! Defines the stored Issue record, its ID, and the filter and patch types
//! used to query and change it.

pub mod fields;
mod filter;
mod ids;
mod patch;
mod record;

pub use fields::Fields;
pub use filter::{Criterion, FilterError, IssueFilter};
pub use ids::IssueId;
pub use patch::{FieldChange, IssuePatch, PatchError};
pub use record::{format_timestamp, now, parse_timestamp, Issue, NewIssue, TextField};
