//! Issue create, patch and detail operations

use super::*;
use crate::domain::Issue;
use crate::schema::{CreateSchema, PatchSchema};
use serde_json::Value;
use tracing::info;

impl<S: IssueRepository> IssueService<S> {
    /// Validate a create payload and insert it.
    ///
    /// The store is only called once every field has passed.
    pub fn create_issue(&self, payload: &Value) -> Result<Issue, ServiceError> {
        let record = CreateSchema::validate(payload)?;
        let issue = self.storage.insert(record)?;
        info!(id = issue.id, "created issue");
        Ok(issue)
    }

    /// Validate a patch payload and apply it to the issue at `raw_id`.
    ///
    /// Fields absent from the payload are left untouched.
    pub fn update_issue(&self, raw_id: &str, payload: &Value) -> Result<Issue, ServiceError> {
        let patch = PatchSchema::validate(payload)?;
        let id = parse_issue_id(raw_id)?;
        let issue = self.storage.update(id, &patch)?;
        info!(id, "updated issue");
        Ok(issue)
    }

    /// Load one issue for the detail view.
    pub fn show_issue(&self, raw_id: &str) -> Result<Issue, ServiceError> {
        let id = parse_issue_id(raw_id)?;
        self.storage
            .get(id)?
            .ok_or_else(|| ServiceError::NotFound(raw_id.to_string()))
    }
}
