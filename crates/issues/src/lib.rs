//! Issue Tracker Library
//!
//! This library provides the core functionality of the issue tracker: payload
//! validation, list-query normalization, storage backends and the service
//! layer the REST server is built on.

pub mod client;
pub mod config;
pub mod domain;
pub mod errors;
pub mod form;
pub mod query;
pub mod schema;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use domain::{Issue, IssueId, IssuePatch, NewIssue, Status};
pub use query::{ListQuery, RawListQuery, SortColumn, PAGE_SIZE};
pub use schema::{CreateSchema, PatchSchema, ValidationErrors};
pub use service::{IssuePage, IssueService, ServiceError, StatusSummary};
pub use storage::{InMemoryStorage, IssueRepository, SqliteStorage, StoreError};
