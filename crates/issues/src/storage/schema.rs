//! DDL statements for the SQLite schema.
//!
//! Timestamps are stored as fixed-width ISO 8601 TEXT so that lexical order
//! equals chronological order. CHECK constraints mirror the payload schemas
//! so rows written by other tools cannot violate the issue invariants.

/// Current schema version. Bumped whenever DDL changes.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Statements executed by `SqliteStorage::init`. All are idempotent.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS issues (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        title               TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 255),
        description         TEXT NOT NULL CHECK (length(description) BETWEEN 1 AND 65535),
        status              TEXT NOT NULL DEFAULT 'OPEN'
                            CHECK (status IN ('OPEN', 'IN_PROGRESS', 'CLOSED')),
        created_at          TEXT NOT NULL,
        updated_at          TEXT NOT NULL,
        assigned_to_user_id TEXT CHECK (assigned_to_user_id IS NULL
                                        OR length(assigned_to_user_id) BETWEEN 1 AND 255)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status)",
    "CREATE INDEX IF NOT EXISTS idx_issues_created_at ON issues(created_at)",
];

/// Column list used by every SELECT; order must match `scan_issue`.
pub const ISSUE_COLUMNS: &str =
    "id, title, description, status, created_at, updated_at, assigned_to_user_id";
