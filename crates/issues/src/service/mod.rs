//! Service layer for all issue operations.
//!
//! The `IssueService` composes schema validation and list-query normalization
//! with calls to an injected [`IssueRepository`]. It is what the REST handlers
//! call; it never renders anything itself.
//!
//! This module is organized into submodules by functional area:
//! - `issue`: create, patch and show
//! - `list`: paginated list pages and latest issues
//! - `summary`: per-status counts for the dashboard

mod issue;
mod list;
mod summary;

pub use list::{IssuePage, DEFAULT_LATEST_LIMIT, MAX_LATEST_LIMIT};
pub use summary::StatusSummary;

use crate::domain::IssueId;
use crate::schema::ValidationErrors;
use crate::storage::{IssueRepository, StoreError};

/// Errors surfaced by service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The payload failed schema validation; the store was not touched.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// No issue with this id (or the id is not a valid issue id at all).
    #[error("issue not found: {0}")]
    NotFound(String),

    /// The store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::NotFound(id.to_string()),
            other => ServiceError::Store(other),
        }
    }
}

/// Executes issue operations against a storage backend.
///
/// Generic over storage backend to support different implementations
/// (SQLite, in-memory, etc.).
pub struct IssueService<S: IssueRepository> {
    storage: S,
    latest_limit: usize,
}

impl<S: IssueRepository> IssueService<S> {
    /// Create a new service with the given storage
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            latest_limit: DEFAULT_LATEST_LIMIT,
        }
    }

    /// Override how many issues `latest` returns when no limit is given.
    pub fn with_latest_limit(mut self, limit: usize) -> Self {
        self.latest_limit = limit.clamp(1, MAX_LATEST_LIMIT);
        self
    }

    /// Get reference to the storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// Parse a path id. Anything that is not a positive integer cannot name an
/// issue, so it is reported as not found.
fn parse_issue_id(raw: &str) -> Result<IssueId, ServiceError> {
    match raw.trim().parse::<IssueId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ServiceError::NotFound(raw.to_string())),
    }
}
