//! Per-status issue counts for the dashboard

use super::*;
use crate::domain::Status;
use crate::storage::IssueFilter;
use serde::{Deserialize, Serialize};

/// Status summary for all issues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub open: u64,
    pub in_progress: u64,
    pub closed: u64,
    pub total: u64,
}

impl<S: IssueRepository> IssueService<S> {
    /// Count issues in each status.
    pub fn status_summary(&self) -> Result<StatusSummary, ServiceError> {
        let count = |status| self.storage.count(&IssueFilter::by_status(status));

        let open = count(Status::Open)?;
        let in_progress = count(Status::InProgress)?;
        let closed = count(Status::Closed)?;

        Ok(StatusSummary {
            open,
            in_progress,
            closed,
            total: open + in_progress + closed,
        })
    }
}
