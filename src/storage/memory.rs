//! In-memory issue store

use super::IssueStore;
use crate::issue::{Issue, IssueFilter, IssueId, IssuePatch, NewIssue};
use crate::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Issue store backed by a vector in process memory
///
/// Keeps insertion order, so listings come back oldest first like the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    issues: Mutex<Vec<Issue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored issues across all projects
    pub async fn len(&self) -> usize {
        self.issues.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Look up one issue by ID
    pub async fn get(&self, id: &IssueId) -> Option<Issue> {
        self.issues.lock().await.iter().find(|i| &i.id == id).cloned()
    }
}

#[async_trait]
impl IssueStore for MemoryStore {
    async fn find(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let issues = self.issues.lock().await;
        Ok(issues.iter().filter(|i| filter.matches(i)).cloned().collect())
    }

    async fn insert(&self, issue: NewIssue) -> Result<Issue> {
        let issue = issue.into_issue(IssueId::generate());
        self.issues.lock().await.push(issue.clone());
        Ok(issue)
    }

    async fn update_by_id(&self, id: &IssueId, patch: &IssuePatch) -> Result<Option<Issue>> {
        let mut issues = self.issues.lock().await;
        Ok(issues.iter_mut().find(|i| &i.id == id).map(|issue| {
            patch.apply_to(issue);
            issue.clone()
        }))
    }

    async fn delete_by_id(&self, id: &IssueId) -> Result<Option<Issue>> {
        let mut issues = self.issues.lock().await;
        let Some(index) = issues.iter().position(|i| &i.id == id) else {
            return Ok(None);
        };
        Ok(Some(issues.remove(index)))
    }
}
