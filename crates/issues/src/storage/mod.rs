//! Storage abstraction layer for persisting issues.
//!
//! This module defines the `IssueRepository` trait that abstracts the store's
//! call contract (`find`, `count`, `get`, `insert`, `update`), allowing the
//! service layer to run against SQLite in production and an in-memory map in
//! tests.

use crate::domain::{Issue, IssueId, IssuePatch, NewIssue, Status};
use crate::query::SortColumn;
use std::cmp::Ordering;

pub mod memory;
pub mod schema;
pub mod sqlite;

// Re-export for convenience
pub use memory::InMemoryStorage;
pub use sqlite::SqliteStorage;

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No issue exists with the given id.
    #[error("issue not found: {0}")]
    NotFound(IssueId),

    /// The backend could not be reached or opened.
    #[error("connection error: {0}")]
    Connection(String),

    /// A write violated a store constraint.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A query failed to execute.
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Row predicate for list and count queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueFilter {
    /// Only issues in this status (None = all).
    pub status: Option<Status>,
}

impl IssueFilter {
    /// Filter on a single status.
    pub fn by_status(status: Status) -> Self {
        Self {
            status: Some(status),
        }
    }

    /// Evaluate the predicate against an in-memory issue.
    pub fn matches(&self, issue: &Issue) -> bool {
        self.status.map_or(true, |status| issue.status == status)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Explicit ordering for a list query.
///
/// Ties are always broken by ascending id so pages are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueOrder {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl IssueOrder {
    pub fn ascending(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }

    /// Compare two issues under this ordering.
    ///
    /// Statuses compare by wire name and titles byte-wise, matching how
    /// SQLite orders the stored TEXT columns.
    pub fn compare(&self, a: &Issue, b: &Issue) -> Ordering {
        let primary = match self.column {
            SortColumn::Title => a.title.cmp(&b.title),
            SortColumn::Status => a.status.as_str().cmp(b.status.as_str()),
            SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let primary = match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| match self.direction {
            SortDirection::Ascending => a.id.cmp(&b.id),
            SortDirection::Descending => b.id.cmp(&a.id),
        })
    }
}

/// Trait for storage backends that persist issues.
///
/// Implementations must be cheap to `Clone`, and clones share the same
/// underlying data, so one handle can be given to each request handler.
///
/// # Examples
///
/// ```
/// use issues::domain::NewIssue;
/// use issues::storage::{InMemoryStorage, IssueFilter, IssueRepository};
///
/// let storage = InMemoryStorage::new();
/// storage.init().unwrap();
///
/// let issue = storage
///     .insert(NewIssue {
///         title: "Fix bug".to_string(),
///         description: "Details".to_string(),
///     })
///     .unwrap();
///
/// assert_eq!(storage.count(&IssueFilter::default()).unwrap(), 1);
/// assert_eq!(storage.get(issue.id).unwrap().unwrap().title, "Fix bug");
/// ```
pub trait IssueRepository: Clone + Send + Sync {
    /// Initialize the storage backend (idempotent).
    fn init(&self) -> Result<(), StoreError>;

    /// Fetch one page of issues matching `filter`.
    ///
    /// With `order` set to `None` the store default applies (ascending id).
    fn find(
        &self,
        filter: &IssueFilter,
        order: Option<IssueOrder>,
        skip: u64,
        take: u32,
    ) -> Result<Vec<Issue>, StoreError>;

    /// Count every issue matching `filter`, ignoring pagination.
    fn count(&self, filter: &IssueFilter) -> Result<u64, StoreError>;

    /// Load an issue by id. Missing ids are `Ok(None)`.
    fn get(&self, id: IssueId) -> Result<Option<Issue>, StoreError>;

    /// Insert a new issue; the store assigns `id` and timestamps.
    fn insert(&self, record: NewIssue) -> Result<Issue, StoreError>;

    /// Apply a partial update and return the updated issue.
    ///
    /// Fields absent from `patch` keep their stored value. An empty patch
    /// leaves the row (including `updated_at`) untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no issue has this id.
    fn update(&self, id: IssueId, patch: &IssuePatch) -> Result<Issue, StoreError>;
}
