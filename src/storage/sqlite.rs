//! SQLite issue store

use super::IssueStore;
use crate::issue::{
    format_timestamp, parse_timestamp, Criterion, FieldChange, Issue, IssueFilter, IssueId,
    IssuePatch, NewIssue,
};
use crate::{Result, TrackerError};
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use tokio::sync::Mutex;

const ISSUE_COLUMNS: &str = "id, project, issue_title, issue_text, created_on, updated_on, \
                             created_by, assigned_to, open, status_text";

/// SQLite store configuration
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to SQLite database file
    pub path: PathBuf,

    /// Enable WAL mode for better concurrency
    pub wal_mode: bool,
}

impl SqliteConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            wal_mode: true,
        }
    }
}

/// Issue store backed by a SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create an issue database
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = %config.path.display(), "Opening issue database");

        let conn = Connection::open(&config.path)?;
        if config.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS issues (
            id TEXT PRIMARY KEY,
            project TEXT NOT NULL,
            issue_title TEXT NOT NULL,
            issue_text TEXT NOT NULL,
            created_on TEXT NOT NULL,
            updated_on TEXT NOT NULL,
            created_by TEXT NOT NULL,
            assigned_to TEXT NOT NULL DEFAULT '',
            open INTEGER NOT NULL DEFAULT 1,
            status_text TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project);
        CREATE INDEX IF NOT EXISTS idx_issues_project_open ON issues(project, open);
        "#,
    )?;
    Ok(())
}

/// Column values as read from a row, before timestamp decoding
struct IssueRow {
    id: String,
    project: String,
    issue_title: String,
    issue_text: String,
    created_on: String,
    updated_on: String,
    created_by: String,
    assigned_to: String,
    open: bool,
    status_text: String,
}

impl IssueRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project: row.get(1)?,
            issue_title: row.get(2)?,
            issue_text: row.get(3)?,
            created_on: row.get(4)?,
            updated_on: row.get(5)?,
            created_by: row.get(6)?,
            assigned_to: row.get(7)?,
            open: row.get(8)?,
            status_text: row.get(9)?,
        })
    }
}

impl TryFrom<IssueRow> for Issue {
    type Error = TrackerError;

    fn try_from(row: IssueRow) -> Result<Self> {
        let corrupt = |reason: &str| TrackerError::CorruptRecord {
            id: row.id.clone(),
            reason: reason.to_string(),
        };
        let id = IssueId::parse(&row.id).ok_or_else(|| corrupt("malformed id"))?;
        let created_on =
            parse_timestamp(&row.created_on).ok_or_else(|| corrupt("bad created_on"))?;
        let updated_on =
            parse_timestamp(&row.updated_on).ok_or_else(|| corrupt("bad updated_on"))?;

        Ok(Issue {
            id,
            project: row.project,
            issue_title: row.issue_title,
            issue_text: row.issue_text,
            created_on,
            updated_on,
            created_by: row.created_by,
            assigned_to: row.assigned_to,
            open: row.open,
            status_text: row.status_text,
        })
    }
}

/// Column and bound value for one filter criterion
fn criterion_column(criterion: &Criterion) -> (&'static str, Value) {
    match criterion {
        Criterion::Id(id) => ("id", Value::Text(id.as_str().to_string())),
        Criterion::Text(field, value) => (field.name(), Value::Text(value.clone())),
        Criterion::Open(open) => ("open", Value::Integer(i64::from(*open))),
        Criterion::CreatedOn(ts) => ("created_on", Value::Text(format_timestamp(ts))),
        Criterion::UpdatedOn(ts) => ("updated_on", Value::Text(format_timestamp(ts))),
    }
}

fn change_value(change: &FieldChange) -> Value {
    match change {
        FieldChange::Text(_, value) => Value::Text(value.clone()),
        FieldChange::Open(open) => Value::Integer(i64::from(*open)),
    }
}

fn select_by_id(conn: &Connection, id: &IssueId) -> Result<Option<Issue>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM issues WHERE id = ?", ISSUE_COLUMNS),
            [id.as_str()],
            IssueRow::from_row,
        )
        .optional()?;
    row.map(Issue::try_from).transpose()
}

#[async_trait]
impl IssueStore for SqliteStore {
    async fn find(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let mut sql = format!("SELECT {} FROM issues WHERE project = ?", ISSUE_COLUMNS);
        let mut values = vec![Value::Text(filter.project().to_string())];
        for criterion in filter.criteria() {
            let (column, value) = criterion_column(criterion);
            sql.push_str(&format!(" AND {} = ?", column));
            values.push(value);
        }
        sql.push_str(" ORDER BY created_on, rowid");

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), IssueRow::from_row)?;

        let mut issues = Vec::new();
        for row in rows {
            issues.push(Issue::try_from(row?)?);
        }

        tracing::debug!(
            project = filter.project(),
            criteria = filter.criteria().len(),
            matched = issues.len(),
            "Queried issues"
        );
        Ok(issues)
    }

    async fn insert(&self, issue: NewIssue) -> Result<Issue> {
        let issue = issue.into_issue(IssueId::generate());

        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO issues ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                ISSUE_COLUMNS
            ),
            params![
                issue.id.as_str(),
                &issue.project,
                &issue.issue_title,
                &issue.issue_text,
                format_timestamp(&issue.created_on),
                format_timestamp(&issue.updated_on),
                &issue.created_by,
                &issue.assigned_to,
                issue.open,
                &issue.status_text,
            ],
        )?;

        Ok(issue)
    }

    async fn update_by_id(&self, id: &IssueId, patch: &IssuePatch) -> Result<Option<Issue>> {
        let mut assignments = Vec::new();
        let mut values = Vec::new();
        for change in patch.changes() {
            assignments.push(format!("{} = ?", change.column()));
            values.push(change_value(change));
        }
        assignments.push("updated_on = ?".to_string());
        values.push(Value::Text(format_timestamp(&patch.updated_on())));
        values.push(Value::Text(id.as_str().to_string()));

        let sql = format!("UPDATE issues SET {} WHERE id = ?", assignments.join(", "));

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let changed = tx.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Ok(None);
        }
        let issue = select_by_id(&tx, id)?;
        tx.commit()?;

        Ok(issue)
    }

    async fn delete_by_id(&self, id: &IssueId) -> Result<Option<Issue>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let Some(issue) = select_by_id(&tx, id)? else {
            return Ok(None);
        };
        tx.execute("DELETE FROM issues WHERE id = ?", [id.as_str()])?;
        tx.commit()?;

        Ok(Some(issue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{now, TextField};
    use tempfile::TempDir;

    fn new_issue(project: &str, created_by: &str) -> NewIssue {
        NewIssue {
            project: project.to_string(),
            issue_title: "Title".to_string(),
            issue_text: "Text".to_string(),
            created_by: created_by.to_string(),
            assigned_to: String::new(),
            status_text: String::new(),
            created_on: now(),
        }
    }

    #[tokio::test]
    async fn test_open_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("issues.db");
        let _store = SqliteStore::open(&SqliteConfig::new(&path)).unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_insert_round_trips() {
        let store = SqliteStore::in_memory().unwrap();
        let inserted = store.insert(new_issue("apitest", "alice")).await.unwrap();

        let found = store.find(&IssueFilter::for_project("apitest")).await.unwrap();
        assert_eq!(found, vec![inserted]);
    }

    #[tokio::test]
    async fn test_find_with_criteria() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.insert(new_issue("apitest", "alice")).await.unwrap();
        let b = store.insert(new_issue("apitest", "bob")).await.unwrap();
        store.insert(new_issue("other", "alice")).await.unwrap();

        let patch = IssuePatch::new(now()).set(FieldChange::Open(false));
        store.update_by_id(&b.id, &patch).await.unwrap();

        let by_creator = IssueFilter::for_project("apitest")
            .with(Criterion::Text(TextField::CreatedBy, "alice".to_string()));
        assert_eq!(store.find(&by_creator).await.unwrap(), vec![a.clone()]);

        let closed = IssueFilter::for_project("apitest").with(Criterion::Open(false));
        let closed = store.find(&closed).await.unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, b.id);

        let by_id = IssueFilter::for_project("apitest").with(Criterion::Id(a.id.clone()));
        assert_eq!(store.find(&by_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_by_id() {
        let store = SqliteStore::in_memory().unwrap();
        let issue = store.insert(new_issue("apitest", "alice")).await.unwrap();
        let later = issue.updated_on + chrono::Duration::milliseconds(250);

        let patch = IssuePatch::new(later)
            .set(FieldChange::Text(TextField::IssueText, "Updated".to_string()));
        let updated = store.update_by_id(&issue.id, &patch).await.unwrap().unwrap();

        assert_eq!(updated.issue_text, "Updated");
        assert_eq!(updated.issue_title, issue.issue_title);
        assert_eq!(updated.created_on, issue.created_on);
        assert_eq!(updated.updated_on, later);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = SqliteStore::in_memory().unwrap();
        let patch = IssuePatch::new(now()).set(FieldChange::Open(false));
        let result = store.update_by_id(&IssueId::generate(), &patch).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let store = SqliteStore::in_memory().unwrap();
        let issue = store.insert(new_issue("apitest", "alice")).await.unwrap();

        let deleted = store.delete_by_id(&issue.id).await.unwrap();
        assert_eq!(deleted, Some(issue.clone()));
        assert!(store.delete_by_id(&issue.id).await.unwrap().is_none());
        assert!(store
            .find(&IssueFilter::for_project("apitest"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = SqliteConfig::new(temp_dir.path().join("issues.db"));

        let inserted = {
            let store = SqliteStore::open(&config).unwrap();
            store.insert(new_issue("apitest", "alice")).await.unwrap()
        };

        let store = SqliteStore::open(&config).unwrap();
        let found = store.find(&IssueFilter::for_project("apitest")).await.unwrap();
        assert_eq!(found, vec![inserted]);
    }
}
