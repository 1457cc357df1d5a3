//! Storage layer
//!
//! Defines the [`IssueStore`] trait the gateway depends on, plus a SQLite
//! backend for real deployments and an in-memory backend for tests and
//! throwaway servers.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SqliteConfig, SqliteStore};

use crate::issue::{Issue, IssueFilter, IssueId, IssuePatch, NewIssue};
use crate::Result;
use async_trait::async_trait;

/// Trait for issue storage backends
///
/// Each method is a single atomic operation on the backend. Callers add no
/// locking of their own.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// All issues matching the filter, oldest first
    async fn find(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;

    /// Persist a new issue under a freshly assigned ID
    async fn insert(&self, issue: NewIssue) -> Result<Issue>;

    /// Apply a patch to the issue with this ID
    ///
    /// Returns the updated issue, or `None` if no issue has this ID.
    async fn update_by_id(&self, id: &IssueId, patch: &IssuePatch) -> Result<Option<Issue>>;

    /// Remove the issue with this ID
    ///
    /// Returns the removed issue, or `None` if no issue has this ID.
    async fn delete_by_id(&self, id: &IssueId) -> Result<Option<Issue>>;
}
