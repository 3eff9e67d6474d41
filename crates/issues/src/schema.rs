//! Declarative validation for issue create and patch payloads.
//!
//! Both schemas take the raw JSON payload exactly as it arrived and either
//! produce a typed write record or a [`ValidationErrors`] map with one message
//! per failing field. There is no partial success: if any field fails, nothing
//! is returned for the fields that passed.

use crate::domain::{IssuePatch, NewIssue, Status};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Maximum title length, in characters, after trimming.
pub const TITLE_MAX_LEN: usize = 255;
/// Maximum description length, in characters.
pub const DESCRIPTION_MAX_LEN: usize = 65_535;
/// Maximum assignee reference length, in characters.
pub const ASSIGNEE_MAX_LEN: usize = 255;

/// Per-field validation failures, keyed by field name.
///
/// Serializes as a flat JSON object: `{"title": "Title is required"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{}", join_fields(.fields))]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`. The first message recorded for a field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Message recorded for `field`, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Iterate `(field, message)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// `"field: message; field: message"`, in field-name order.
fn join_fields(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Length rule for one text field.
struct TextRule {
    field: &'static str,
    label: &'static str,
    max: usize,
    trim: bool,
}

const TITLE: TextRule = TextRule {
    field: "title",
    label: "Title",
    max: TITLE_MAX_LEN,
    trim: true,
};

const DESCRIPTION: TextRule = TextRule {
    field: "description",
    label: "Description",
    max: DESCRIPTION_MAX_LEN,
    trim: false,
};

const ASSIGNEE: TextRule = TextRule {
    field: "assignedToUserId",
    label: "Assigned to",
    max: ASSIGNEE_MAX_LEN,
    trim: false,
};

impl TextRule {
    fn required_message(&self) -> String {
        format!("{} is required", self.label)
    }

    fn type_message(&self) -> String {
        format!("{} must be a string", self.label)
    }

    /// Check a present value; returns the value to store.
    fn check(&self, value: &Value) -> Result<String, String> {
        let raw = value.as_str().ok_or_else(|| self.type_message())?;
        if raw.contains('\0') {
            return Err(format!("{} must not contain NUL characters", self.label));
        }
        let text = if self.trim { raw.trim() } else { raw };
        let len = text.chars().count();
        if len == 0 {
            return Err(self.required_message());
        }
        if len > self.max {
            return Err(format!(
                "{} must be at most {} characters",
                self.label, self.max
            ));
        }
        Ok(text.to_string())
    }

    /// Required field: missing and null both fail.
    fn required(&self, obj: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<String> {
        match obj.get(self.field) {
            None | Some(Value::Null) => {
                errors.add(self.field, self.required_message());
                None
            }
            Some(value) => self.record(value, errors),
        }
    }

    /// Optional, non-nullable field: missing is fine, null fails.
    fn optional(&self, obj: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<String> {
        match obj.get(self.field) {
            None => None,
            Some(value) => self.record(value, errors),
        }
    }

    /// Optional, nullable field: missing → `None`, null → `Some(None)`.
    fn nullable(
        &self,
        obj: &Map<String, Value>,
        errors: &mut ValidationErrors,
    ) -> Option<Option<String>> {
        match obj.get(self.field) {
            None => None,
            Some(Value::Null) => Some(None),
            Some(value) => self.record(value, errors).map(Some),
        }
    }

    fn record(&self, value: &Value, errors: &mut ValidationErrors) -> Option<String> {
        match self.check(value) {
            Ok(text) => Some(text),
            Err(message) => {
                errors.add(self.field, message);
                None
            }
        }
    }
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    payload.as_object().ok_or_else(|| {
        let mut errors = ValidationErrors::new();
        errors.add("payload", "Expected a JSON object");
        errors
    })
}

/// Schema for new issues: `title` and `description` are both required.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateSchema;

impl CreateSchema {
    pub fn validate(payload: &Value) -> Result<NewIssue, ValidationErrors> {
        let obj = as_object(payload)?;
        let mut errors = ValidationErrors::new();

        let title = TITLE.required(obj, &mut errors);
        let description = DESCRIPTION.required(obj, &mut errors);

        match (title, description) {
            (Some(title), Some(description)) => {
                errors.into_result(NewIssue { title, description })
            }
            _ => Err(errors),
        }
    }
}

/// Schema for partial updates: every field is optional.
///
/// `assignedToUserId` may be `null` to unassign; `status` must be one of the
/// known status names when present.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchSchema;

impl PatchSchema {
    pub fn validate(payload: &Value) -> Result<IssuePatch, ValidationErrors> {
        let obj = as_object(payload)?;
        let mut errors = ValidationErrors::new();

        let patch = IssuePatch {
            title: TITLE.optional(obj, &mut errors),
            description: DESCRIPTION.optional(obj, &mut errors),
            status: validate_status(obj, &mut errors),
            assigned_to_user_id: ASSIGNEE.nullable(obj, &mut errors),
        };

        errors.into_result(patch)
    }
}

fn validate_status(obj: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<Status> {
    let value = obj.get("status")?;
    match value.as_str().map(str::parse::<Status>) {
        Some(Ok(status)) => Some(status),
        _ => {
            let names: Vec<&str> = Status::ALL.iter().map(Status::as_str).collect();
            errors.add(
                "status",
                format!("Status must be one of {}", names.join(", ")),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_accepts_valid_payload() {
        let record = CreateSchema::validate(&json!({
            "title": "Crash on save",
            "description": "Stack trace attached"
        }))
        .unwrap();
        assert_eq!(record.title, "Crash on save");
        assert_eq!(record.description, "Stack trace attached");
    }

    #[test]
    fn test_create_reports_every_failing_field() {
        let errors = CreateSchema::validate(&json!({})).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.get("description"), Some("Description is required"));
    }

    #[test]
    fn test_create_trims_title() {
        let record = CreateSchema::validate(&json!({
            "title": "  padded  ",
            "description": "d"
        }))
        .unwrap();
        assert_eq!(record.title, "padded");
    }

    #[test]
    fn test_create_rejects_whitespace_only_title() {
        let errors = CreateSchema::validate(&json!({
            "title": "   ",
            "description": "d"
        }))
        .unwrap_err();
        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.get("description"), None);
    }

    #[test]
    fn test_title_length_boundary() {
        let at_limit = "a".repeat(TITLE_MAX_LEN);
        assert!(CreateSchema::validate(&json!({"title": at_limit, "description": "d"})).is_ok());

        let over = "a".repeat(TITLE_MAX_LEN + 1);
        let errors =
            CreateSchema::validate(&json!({"title": over, "description": "d"})).unwrap_err();
        assert_eq!(
            errors.get("title"),
            Some("Title must be at most 255 characters")
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 255 multi-byte characters are still 255 characters
        let title = "é".repeat(TITLE_MAX_LEN);
        assert!(CreateSchema::validate(&json!({"title": title, "description": "d"})).is_ok());
    }

    #[test]
    fn test_description_too_long() {
        let description = "x".repeat(DESCRIPTION_MAX_LEN + 1);
        let errors =
            CreateSchema::validate(&json!({"title": "t", "description": description}))
                .unwrap_err();
        assert!(errors.get("description").is_some());
    }

    #[test]
    fn test_wrong_type_is_a_field_error() {
        let errors =
            CreateSchema::validate(&json!({"title": 42, "description": "d"})).unwrap_err();
        assert_eq!(errors.get("title"), Some("Title must be a string"));
    }

    #[test]
    fn test_non_object_payload() {
        let errors = CreateSchema::validate(&json!(["title"])).unwrap_err();
        assert_eq!(errors.get("payload"), Some("Expected a JSON object"));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let record = CreateSchema::validate(&json!({
            "title": "t",
            "description": "d",
            "status": "CLOSED",
            "id": 99
        }))
        .unwrap();
        assert_eq!(record.title, "t");
    }

    #[test]
    fn test_patch_with_only_title() {
        let patch = PatchSchema::validate(&json!({"title": "New Title"})).unwrap();
        assert_eq!(patch.title.as_deref(), Some("New Title"));
        assert_eq!(patch.description, None);
        assert_eq!(patch.assigned_to_user_id, None);
        assert_eq!(patch.status, None);
    }

    #[test]
    fn test_patch_empty_object_is_valid() {
        let patch = PatchSchema::validate(&json!({})).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_patch_null_assignee_unassigns() {
        let patch = PatchSchema::validate(&json!({"assignedToUserId": null})).unwrap();
        assert_eq!(patch.assigned_to_user_id, Some(None));
    }

    #[test]
    fn test_patch_assignee_rules() {
        let patch = PatchSchema::validate(&json!({"assignedToUserId": "user-1"})).unwrap();
        assert_eq!(patch.assigned_to_user_id, Some(Some("user-1".to_string())));

        let errors = PatchSchema::validate(&json!({"assignedToUserId": ""})).unwrap_err();
        assert_eq!(errors.get("assignedToUserId"), Some("Assigned to is required"));

        let long = "u".repeat(ASSIGNEE_MAX_LEN + 1);
        assert!(PatchSchema::validate(&json!({"assignedToUserId": long})).is_err());
    }

    #[test]
    fn test_patch_null_title_is_rejected() {
        let errors = PatchSchema::validate(&json!({"title": null})).unwrap_err();
        assert_eq!(errors.get("title"), Some("Title must be a string"));
    }

    #[test]
    fn test_patch_status() {
        let patch = PatchSchema::validate(&json!({"status": "CLOSED"})).unwrap();
        assert_eq!(patch.status, Some(Status::Closed));

        let errors = PatchSchema::validate(&json!({"status": "DONE"})).unwrap_err();
        assert_eq!(
            errors.get("status"),
            Some("Status must be one of OPEN, IN_PROGRESS, CLOSED")
        );
    }

    #[test]
    fn test_patch_rejects_whole_payload_on_any_failure() {
        let result = PatchSchema::validate(&json!({
            "title": "fine",
            "description": ""
        }));
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("description").is_some());
    }

    #[test]
    fn test_errors_serialize_as_flat_object() {
        let errors = CreateSchema::validate(&json!({"description": "d"})).unwrap_err();
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value, json!({"title": "Title is required"}));
    }

    #[test]
    fn test_errors_display() {
        let errors = CreateSchema::validate(&json!({})).unwrap_err();
        assert_eq!(
            errors.to_string(),
            "description: Description is required; title: Title is required"
        );
    }

    #[test]
    fn test_nul_characters_are_rejected() {
        let errors = CreateSchema::validate(&json!({
            "title": "Crash",
            "description": "\u{0}stack trace"
        }))
        .unwrap_err();
        assert_eq!(
            errors.get("description"),
            Some("Description must not contain NUL characters")
        );
        assert_eq!(errors.get("title"), None);

        let errors = PatchSchema::validate(&json!({
            "title": "a\u{0}b",
            "assignedToUserId": "u\u{0}"
        }))
        .unwrap_err();
        assert_eq!(errors.get("title"), Some("Title must not contain NUL characters"));
        assert_eq!(
            errors.get("assignedToUserId"),
            Some("Assigned to must not contain NUL characters")
        );
    }
}
