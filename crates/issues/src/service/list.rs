//! Issue list pages and latest issues

use super::*;
use crate::domain::{Issue, Status};
use crate::query::{ListQuery, RawListQuery, SortColumn, PAGE_SIZE};
use crate::storage::{IssueFilter, IssueOrder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of issues returned by `latest`.
pub const DEFAULT_LATEST_LIMIT: usize = 5;
/// Upper bound on `latest`, whatever the caller asks for.
pub const MAX_LATEST_LIMIT: usize = 50;

/// One rendered page of the issue list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePage {
    /// Rows on this page
    pub issues: Vec<Issue>,
    /// Issues matching the filter across all pages
    pub total: u64,
    /// 1-based page number that was requested
    pub page: u32,
    pub page_size: u32,
    /// Number of pages needed for `total` (0 when nothing matches)
    pub page_count: u64,
    /// Status filter actually applied
    pub status: Option<Status>,
    /// Sort column actually applied
    pub order_by: Option<SortColumn>,
}

impl<S: IssueRepository> IssueService<S> {
    /// Produce one page of the issue list from raw query parameters.
    ///
    /// The page query and the count query are built from the same
    /// [`IssueFilter`], so `total` always describes the filter that produced
    /// `issues`.
    pub fn list_page(&self, raw: &RawListQuery) -> Result<IssuePage, ServiceError> {
        let query = ListQuery::normalize(raw);
        debug!(?query, "listing issues");

        let filter = query.filter();
        let issues = self
            .storage
            .find(&filter, query.order(), query.skip(), query.take())?;
        let total = self.storage.count(&filter)?;

        Ok(IssuePage {
            issues,
            total,
            page: query.page(),
            page_size: PAGE_SIZE,
            page_count: total.div_ceil(u64::from(PAGE_SIZE)),
            status: query.status(),
            order_by: query.order_by(),
        })
    }

    /// The most recently created issues, newest first.
    ///
    /// `limit` defaults to the service's configured value and is capped at
    /// [`MAX_LATEST_LIMIT`].
    pub fn latest_issues(&self, limit: Option<usize>) -> Result<Vec<Issue>, ServiceError> {
        let limit = limit
            .unwrap_or(self.latest_limit)
            .clamp(1, MAX_LATEST_LIMIT);
        let issues = self.storage.find(
            &IssueFilter::default(),
            Some(IssueOrder::descending(SortColumn::CreatedAt)),
            0,
            limit as u32,
        )?;
        Ok(issues)
    }
}
