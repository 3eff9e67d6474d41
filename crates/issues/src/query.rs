//! List-query normalization.
//!
//! The issue list is driven by untrusted query-string parameters. [`ListQuery::normalize`]
//! turns them into a descriptor that is always safe to hand to a store: unknown
//! statuses mean "no filter", unknown sort columns mean "store default order",
//! and anything that is not a positive page number means page 1. It never fails.

use crate::domain::Status;
use crate::storage::{IssueFilter, IssueOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Rows per list page.
pub const PAGE_SIZE: u32 = 10;

/// Columns the list may be sorted by.
///
/// Only these names ever reach the storage layer; anything else in `orderBy`
/// is dropped during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortColumn {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl SortColumn {
    /// The allow-list, in display order.
    pub const ALL: [SortColumn; 3] = [SortColumn::Title, SortColumn::Status, SortColumn::CreatedAt];

    /// Query-string name of the column.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortColumn::Title => "title",
            SortColumn::Status => "status",
            SortColumn::CreatedAt => "createdAt",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for SortColumn {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortColumn::ALL
            .into_iter()
            .find(|column| column.as_param() == s)
            .ok_or(())
    }
}

/// List parameters exactly as received. Every field is untrusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListQuery {
    pub status: Option<String>,
    pub order_by: Option<String>,
    pub page: Option<String>,
}

impl RawListQuery {
    /// Pick the list parameters out of a decoded query-string map.
    ///
    /// Unrelated keys are ignored.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            status: params.get("status").cloned(),
            order_by: params.get("orderBy").cloned(),
            page: params.get("page").cloned(),
        }
    }
}

/// Sanitized list descriptor.
///
/// Only obtainable through [`ListQuery::normalize`] (or `Default`, which is
/// the normalization of an empty query), so `skip` and `take` always agree
/// with `page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    status: Option<Status>,
    order_by: Option<SortColumn>,
    page: u32,
    skip: u64,
    take: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::with(None, None, 1)
    }
}

impl ListQuery {
    /// Normalize raw parameters. Total: malformed input falls back to defaults.
    pub fn normalize(raw: &RawListQuery) -> Self {
        let status = raw.status.as_deref().and_then(|s| s.parse::<Status>().ok());
        let order_by = raw
            .order_by
            .as_deref()
            .and_then(|s| s.parse::<SortColumn>().ok());
        let page = raw.page.as_deref().map(parse_page).unwrap_or(1);

        Self::with(status, order_by, page)
    }

    fn with(status: Option<Status>, order_by: Option<SortColumn>, page: u32) -> Self {
        Self {
            status,
            order_by,
            page,
            skip: u64::from(page - 1) * u64::from(PAGE_SIZE),
            take: PAGE_SIZE,
        }
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    pub fn order_by(&self) -> Option<SortColumn> {
        self.order_by
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Rows to skip before the page starts.
    pub fn skip(&self) -> u64 {
        self.skip
    }

    /// Rows on a page.
    pub fn take(&self) -> u32 {
        self.take
    }

    /// Filter predicate shared by the page query and the count query.
    pub fn filter(&self) -> IssueFilter {
        IssueFilter {
            status: self.status,
        }
    }

    /// Explicit ordering, if a known column was requested. Always ascending.
    pub fn order(&self) -> Option<IssueOrder> {
        self.order_by.map(IssueOrder::ascending)
    }

    /// Render back to raw parameters (e.g. for pagination links).
    ///
    /// `ListQuery::normalize(&q.to_raw()) == q` for every descriptor.
    pub fn to_raw(&self) -> RawListQuery {
        RawListQuery {
            status: self.status.map(|s| s.as_str().to_string()),
            order_by: self.order_by.map(|c| c.as_param().to_string()),
            page: Some(self.page.to_string()),
        }
    }
}

/// Strict positive integer parse; anything else is page 1.
fn parse_page(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(page) if page >= 1 => page,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: Option<&str>, order_by: Option<&str>, page: Option<&str>) -> RawListQuery {
        RawListQuery {
            status: status.map(String::from),
            order_by: order_by.map(String::from),
            page: page.map(String::from),
        }
    }

    #[test]
    fn test_empty_query_defaults() {
        let q = ListQuery::normalize(&RawListQuery::default());
        assert_eq!(q, ListQuery::default());
        assert_eq!(q.status(), None);
        assert_eq!(q.order_by(), None);
        assert_eq!(q.page(), 1);
        assert_eq!(q.skip(), 0);
        assert_eq!(q.take(), PAGE_SIZE);
    }

    #[test]
    fn test_known_status_is_kept() {
        let q = ListQuery::normalize(&raw(Some("IN_PROGRESS"), None, None));
        assert_eq!(q.status(), Some(Status::InProgress));
        assert_eq!(q.filter().status, Some(Status::InProgress));
    }

    #[test]
    fn test_unknown_status_means_no_filter() {
        for bogus in ["BOGUS", "open", "", " OPEN", "CLOSED;DROP TABLE issues"] {
            let q = ListQuery::normalize(&raw(Some(bogus), None, None));
            assert_eq!(q.status(), None, "status {:?} should be dropped", bogus);
            assert_eq!(q.filter(), IssueFilter::default());
        }
    }

    #[test]
    fn test_order_by_allow_list() {
        for column in SortColumn::ALL {
            let q = ListQuery::normalize(&raw(None, Some(column.as_param()), None));
            assert_eq!(q.order_by(), Some(column));
            assert_eq!(q.order(), Some(IssueOrder::ascending(column)));
        }

        for bogus in ["description", "id", "created_at", "title desc", "TITLE"] {
            let q = ListQuery::normalize(&raw(None, Some(bogus), None));
            assert_eq!(q.order_by(), None, "column {:?} should be dropped", bogus);
            assert_eq!(q.order(), None);
        }
    }

    #[test]
    fn test_page_three() {
        let q = ListQuery::normalize(&raw(None, None, Some("3")));
        assert_eq!(q.page(), 3);
        assert_eq!(q.skip(), 20);
        assert_eq!(q.take(), 10);
    }

    #[test]
    fn test_bad_pages_fall_back_to_one() {
        for bogus in ["0", "-1", "abc", "", "2abc", "1.5", "99999999999"] {
            let q = ListQuery::normalize(&raw(None, None, Some(bogus)));
            assert_eq!(q.page(), 1, "page {:?} should fall back", bogus);
            assert_eq!(q.skip(), 0);
        }
    }

    #[test]
    fn test_page_tolerates_surrounding_whitespace() {
        let q = ListQuery::normalize(&raw(None, None, Some(" 4 ")));
        assert_eq!(q.page(), 4);
    }

    #[test]
    fn test_max_page_does_not_overflow_skip() {
        let q = ListQuery::normalize(&raw(None, None, Some(&u32::MAX.to_string())));
        assert_eq!(q.page(), u32::MAX);
        assert_eq!(q.skip(), u64::from(u32::MAX - 1) * 10);
    }

    #[test]
    fn test_mixed_scenario() {
        let q = ListQuery::normalize(&raw(Some("BOGUS"), Some("title"), Some("2")));
        assert_eq!(q.status(), None);
        assert_eq!(q.order_by(), Some(SortColumn::Title));
        assert_eq!(q.page(), 2);
        assert_eq!(q.skip(), 10);
        assert_eq!(q.take(), 10);
    }

    #[test]
    fn test_from_params_ignores_other_keys() {
        let mut params = HashMap::new();
        params.insert("status".to_string(), "CLOSED".to_string());
        params.insert("orderBy".to_string(), "createdAt".to_string());
        params.insert("utm_source".to_string(), "mail".to_string());

        let raw = RawListQuery::from_params(&params);
        assert_eq!(raw.status.as_deref(), Some("CLOSED"));
        assert_eq!(raw.order_by.as_deref(), Some("createdAt"));
        assert_eq!(raw.page, None);
    }

    #[test]
    fn test_serialized_descriptor() {
        let q = ListQuery::normalize(&raw(Some("OPEN"), Some("createdAt"), Some("2")));
        let value = serde_json::to_value(q).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "status": "OPEN",
                "orderBy": "createdAt",
                "page": 2,
                "skip": 10,
                "take": 10
            })
        );
    }
}
