//! In-memory storage implementation for testing.
//!
//! This backend keeps every issue in a `BTreeMap` keyed by id. Each instance
//! is isolated, making it ideal for parallel test execution and for running
//! the server without a database file.

use crate::domain::{Issue, IssueId, IssuePatch, NewIssue};
use crate::storage::{IssueFilter, IssueOrder, IssueRepository, StoreError};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    issues: BTreeMap<IssueId, Issue>,
    last_id: IssueId,
}

/// In-memory storage backend.
///
/// All data is lost when the last clone is dropped. Uses `Arc<Mutex<>>` for
/// shared interior mutability - clones share the same data.
///
/// # Examples
///
/// ```
/// use issues::domain::NewIssue;
/// use issues::storage::{InMemoryStorage, IssueRepository};
///
/// let storage = InMemoryStorage::new();
/// let issue = storage
///     .insert(NewIssue {
///         title: "Test".to_string(),
///         description: "Description".to_string(),
///     })
///     .unwrap();
///
/// let loaded = storage.get(issue.id).unwrap().unwrap();
/// assert_eq!(loaded.title, "Test");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStorage {
    /// Create a new, empty in-memory storage instance.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Connection(format!("mutex poisoned: {e}")))
    }
}

impl IssueRepository for InMemoryStorage {
    fn init(&self) -> Result<(), StoreError> {
        // No initialization needed for in-memory storage
        Ok(())
    }

    fn find(
        &self,
        filter: &IssueFilter,
        order: Option<IssueOrder>,
        skip: u64,
        take: u32,
    ) -> Result<Vec<Issue>, StoreError> {
        let inner = self.lock()?;
        // BTreeMap iteration is already the default (ascending id) order
        let mut matching: Vec<&Issue> = inner
            .issues
            .values()
            .filter(|issue| filter.matches(issue))
            .collect();

        if let Some(order) = order {
            matching.sort_by(|a, b| order.compare(a, b));
        }

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(skip)
            .take(take as usize)
            .cloned()
            .collect())
    }

    fn count(&self, filter: &IssueFilter) -> Result<u64, StoreError> {
        let inner = self.lock()?;
        Ok(inner.issues.values().filter(|i| filter.matches(i)).count() as u64)
    }

    fn get(&self, id: IssueId) -> Result<Option<Issue>, StoreError> {
        Ok(self.lock()?.issues.get(&id).cloned())
    }

    fn insert(&self, record: NewIssue) -> Result<Issue, StoreError> {
        let mut inner = self.lock()?;
        inner.last_id += 1;
        let issue = record.into_issue(inner.last_id, Utc::now());
        inner.issues.insert(issue.id, issue.clone());
        Ok(issue)
    }

    fn update(&self, id: IssueId, patch: &IssuePatch) -> Result<Issue, StoreError> {
        let mut inner = self.lock()?;
        let issue = inner.issues.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if patch.apply_to(issue) {
            issue.updated_at = Utc::now();
        }
        Ok(issue.clone())
    }
}
