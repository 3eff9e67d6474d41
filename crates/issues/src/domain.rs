//! Core domain types for the issue tracker.
//!
//! This module defines the persisted `Issue` entity, its lifecycle status and
//! the two write records (`NewIssue`, `IssuePatch`) produced by schema
//! validation and consumed by the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned issue identifier
pub type IssueId = i64;

/// Issue lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Newly reported, not yet picked up (default)
    #[default]
    Open,
    /// Currently being worked on
    InProgress,
    /// Resolved
    Closed,
}

impl Status {
    /// Every status, in declaration order.
    pub const ALL: [Status; 3] = [Status::Open, Status::InProgress, Status::Closed];

    /// Wire and storage name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::InProgress => "IN_PROGRESS",
            Status::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known status names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    /// Exact, case-sensitive match against the wire names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A tracked problem or task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique identifier, assigned by the store on creation
    pub id: IssueId,
    /// Short summary (1-255 characters)
    pub title: String,
    /// Markdown body (1-65535 characters)
    pub description: String,
    /// Current lifecycle status
    pub status: Status,
    /// When the issue was created; never changes afterwards
    pub created_at: DateTime<Utc>,
    /// When the issue was last modified
    pub updated_at: DateTime<Utc>,
    /// Reference to the assigned user, if any
    pub assigned_to_user_id: Option<String>,
}

/// Validated fields for inserting a new issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
}

impl NewIssue {
    /// Materialize the record as an issue with the given id and creation time.
    ///
    /// New issues always start `OPEN` and unassigned.
    pub fn into_issue(self, id: IssueId, now: DateTime<Utc>) -> Issue {
        Issue {
            id,
            title: self.title,
            description: self.description,
            status: Status::Open,
            created_at: now,
            updated_at: now,
            assigned_to_user_id: None,
        }
    }
}

/// Validated partial update.
///
/// `None` means "leave the field as it is". For `assigned_to_user_id` the
/// inner option distinguishes "unassign" (`Some(None)`) from "not supplied"
/// (`None`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IssuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_user_id: Option<Option<String>>,
}

impl IssuePatch {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assigned_to_user_id.is_none()
    }

    /// Apply the supplied fields to `issue`, leaving the rest untouched.
    ///
    /// Returns true if anything was written.
    pub fn apply_to(&self, issue: &mut Issue) -> bool {
        if let Some(ref title) = self.title {
            issue.title = title.clone();
        }
        if let Some(ref description) = self.description {
            issue.description = description.clone();
        }
        if let Some(status) = self.status {
            issue.status = status;
        }
        if let Some(ref assignee) = self.assigned_to_user_id {
            issue.assigned_to_user_id = assignee.clone();
        }
        !self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_issue() -> Issue {
        NewIssue {
            title: "Login button misaligned".to_string(),
            description: "Shifted 4px on mobile".to_string(),
        }
        .into_issue(1, Utc::now())
    }

    #[test]
    fn test_new_issue_defaults() {
        let issue = sample_issue();
        assert_eq!(issue.id, 1);
        assert_eq!(issue.status, Status::Open);
        assert_eq!(issue.assigned_to_user_id, None);
        assert_eq!(issue.created_at, issue.updated_at);
    }

    #[test]
    fn test_status_round_trips_through_wire_name() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_parse_is_case_sensitive() {
        assert!("open".parse::<Status>().is_err());
        assert!("IN-PROGRESS".parse::<Status>().is_err());
        assert!("".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }

    #[test]
    fn test_issue_serializes_camel_case() {
        let issue = sample_issue();
        let value = serde_json::to_value(&issue).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("assignedToUserId").is_some());
        assert_eq!(value["status"], "OPEN");
    }

    #[test]
    fn test_patch_only_touches_supplied_fields() {
        let mut issue = sample_issue();
        issue.assigned_to_user_id = Some("user-7".to_string());
        let original = issue.clone();

        let patch = IssuePatch {
            title: Some("New Title".to_string()),
            ..Default::default()
        };
        assert!(patch.apply_to(&mut issue));

        assert_eq!(issue.title, "New Title");
        assert_eq!(issue.description, original.description);
        assert_eq!(issue.assigned_to_user_id, original.assigned_to_user_id);
        assert_eq!(issue.status, original.status);
    }

    #[test]
    fn test_patch_can_unassign() {
        let mut issue = sample_issue();
        issue.assigned_to_user_id = Some("user-7".to_string());

        let patch = IssuePatch {
            assigned_to_user_id: Some(None),
            ..Default::default()
        };
        patch.apply_to(&mut issue);
        assert_eq!(issue.assigned_to_user_id, None);
    }

    #[test]
    fn test_empty_patch_is_noop() {
        let mut issue = sample_issue();
        let original = issue.clone();
        let patch = IssuePatch::default();
        assert!(patch.is_empty());
        assert!(!patch.apply_to(&mut issue));
        assert_eq!(issue, original);
    }

    #[test]
    fn test_patch_serializes_only_supplied_fields() {
        let patch = IssuePatch {
            title: Some("Renamed".to_string()),
            assigned_to_user_id: Some(None),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"title": "Renamed", "assignedToUserId": null})
        );
    }
}
