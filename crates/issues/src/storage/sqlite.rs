//! SQLite-backed storage implementation.
//!
//! The connection lives behind a mutex; every operation acquires the lock,
//! runs its SQL and releases it. Column names in ORDER BY clauses come only
//! from [`SortColumn`]'s fixed mapping, and every value is bound as a
//! parameter.

use crate::domain::{Issue, IssueId, IssuePatch, NewIssue, Status};
use crate::query::SortColumn;
use crate::storage::schema::{CURRENT_SCHEMA_VERSION, ISSUE_COLUMNS, SCHEMA_STATEMENTS};
use crate::storage::{IssueFilter, IssueOrder, IssueRepository, SortDirection, StoreError};
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// SQLite implementation of [`IssueRepository`].
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) a database file. Call [`IssueRepository::init`] before use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!(?path, "opening SQLite database");

        let conn = Connection::open(path).map_err(|e| {
            StoreError::Connection(format!("failed to open {}: {e}", path.display()))
        })?;
        // WAL only applies to file databases
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Connection(format!("failed to enable WAL: {e}")))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("opening in-memory SQLite database");
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Connection(format!("failed to open in-memory db: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| StoreError::Connection(format!("failed to set busy timeout: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Connection(format!("mutex poisoned: {e}")))
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage").finish_non_exhaustive()
    }
}

impl IssueRepository for SqliteStorage {
    fn init(&self) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;

        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version >= CURRENT_SCHEMA_VERSION {
            debug!(version, "schema already at current version, skipping init");
            return Ok(());
        }

        for stmt in SCHEMA_STATEMENTS {
            conn.execute_batch(stmt)?;
        }
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;

        info!("schema initialized (version {})", CURRENT_SCHEMA_VERSION);
        Ok(())
    }

    fn find(
        &self,
        filter: &IssueFilter,
        order: Option<IssueOrder>,
        skip: u64,
        take: u32,
    ) -> Result<Vec<Issue>, StoreError> {
        let conn = self.lock_conn()?;

        let (where_sql, mut param_values) = where_clause(filter);
        let order_sql = order_clause(order);
        let limit_idx = param_values.len() + 1;
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues {where_sql} {order_sql} LIMIT ?{} OFFSET ?{}",
            limit_idx,
            limit_idx + 1
        );
        param_values.push(Box::new(i64::from(take)));
        param_values.push(Box::new(i64::try_from(skip).unwrap_or(i64::MAX)));

        let param_refs: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), scan_issue)?;

        let mut issues = Vec::new();
        for row in rows {
            issues.push(row?);
        }
        Ok(issues)
    }

    fn count(&self, filter: &IssueFilter) -> Result<u64, StoreError> {
        let conn = self.lock_conn()?;

        let (where_sql, param_values) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM issues {where_sql}");
        let param_refs: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn get(&self, id: IssueId) -> Result<Option<Issue>, StoreError> {
        let conn = self.lock_conn()?;
        get_on_conn(&conn, id)
    }

    fn insert(&self, record: NewIssue) -> Result<Issue, StoreError> {
        let conn = self.lock_conn()?;
        let now = Utc::now().trunc_subsecs(6);
        let now_str = format_datetime(&now);

        conn.execute(
            "INSERT INTO issues (title, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![record.title, record.description, Status::Open.as_str(), now_str],
        )
        .map_err(map_write_error)?;

        let id = conn.last_insert_rowid();
        debug!(id, "inserted issue");
        Ok(record.into_issue(id, now))
    }

    fn update(&self, id: IssueId, patch: &IssuePatch) -> Result<Issue, StoreError> {
        let mut conn = self.lock_conn()?;

        if patch.is_empty() {
            return get_on_conn(&conn, id)?.ok_or(StoreError::NotFound(id));
        }

        // Build SET clause only from supplied fields.
        let mut set_clauses: Vec<&str> = Vec::new();
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref title) = patch.title {
            set_clauses.push("title = ?");
            param_values.push(Box::new(title.clone()));
        }
        if let Some(ref description) = patch.description {
            set_clauses.push("description = ?");
            param_values.push(Box::new(description.clone()));
        }
        if let Some(status) = patch.status {
            set_clauses.push("status = ?");
            param_values.push(Box::new(status.as_str()));
        }
        // Outer Some means "update"; the inner Option is the new value.
        if let Some(ref assignee) = patch.assigned_to_user_id {
            set_clauses.push("assigned_to_user_id = ?");
            param_values.push(Box::new(assignee.clone()));
        }

        set_clauses.push("updated_at = ?");
        param_values.push(Box::new(format_datetime(&Utc::now().trunc_subsecs(6))));

        let sql = format!("UPDATE issues SET {} WHERE id = ?", set_clauses.join(", "));
        param_values.push(Box::new(id));

        let param_refs: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let tx = conn.transaction()?;
        let affected = tx
            .execute(&sql, param_refs.as_slice())
            .map_err(map_write_error)?;
        if affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        let issue = get_on_conn(&tx, id)?.ok_or(StoreError::NotFound(id))?;
        tx.commit()?;

        Ok(issue)
    }
}

fn get_on_conn(conn: &Connection, id: IssueId) -> Result<Option<Issue>, StoreError> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], scan_issue).optional()?)
}

fn where_clause(filter: &IssueFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut where_clauses: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        param_values.push(Box::new(status.as_str()));
        where_clauses.push(format!("status = ?{}", param_values.len()));
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };
    (where_sql, param_values)
}

fn order_clause(order: Option<IssueOrder>) -> String {
    match order {
        None => "ORDER BY id ASC".to_string(),
        Some(order) => {
            let dir = match order.direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            format!("ORDER BY {} {dir}, id {dir}", sort_column_sql(order.column))
        }
    }
}

fn sort_column_sql(column: SortColumn) -> &'static str {
    match column {
        SortColumn::Title => "title",
        SortColumn::Status => "status",
        SortColumn::CreatedAt => "created_at",
    }
}

fn map_write_error(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
            StoreError::Constraint(msg.unwrap_or_else(|| err.to_string()))
        }
        other => StoreError::Query(other),
    }
}

/// Deserialises a row into an [`Issue`].
///
/// The column order MUST match [`ISSUE_COLUMNS`].
fn scan_issue(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let status_str: String = row.get("status")?;
    let status = status_str
        .parse::<Status>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(Issue {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        created_at: parse_datetime(4, &row.get::<_, String>("created_at")?)?,
        updated_at: parse_datetime(5, &row.get::<_, String>("updated_at")?)?,
        assigned_to_user_id: row.get("assigned_to_user_id")?,
    })
}

/// Formats a timestamp as fixed-width ISO 8601 TEXT.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
