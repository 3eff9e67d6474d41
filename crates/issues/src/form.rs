//! Client-side issue form submission.
//!
//! An [`IssueForm`] drives validate → submit → navigate for the create and
//! edit forms. Its state lives in a shared [`FormStateCell`] so a view can
//! observe `Pending` while the request is in flight:
//!
//! ```text
//! Idle ──submit──▶ Pending ──ok──▶ Settled(Saved)   (navigate to /issues)
//!   ▲                 │
//!   │                 └──err─▶ Settled(Failed)     (generic message shown)
//!   └── local validation failure (field errors, no request sent)
//! ```

use crate::domain::{Issue, IssueId, IssuePatch, NewIssue};
use crate::schema::{CreateSchema, PatchSchema, ValidationErrors};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Message shown for every failed submission, whatever the cause.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Where a successful submission navigates to.
pub const ISSUE_LIST_ROUTE: &str = "/issues";

/// Errors from the network call behind a submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server responded with status {0}")]
    Status(u16),

    /// The response body was not an issue.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Network side of the form: create and update calls.
pub trait IssueSubmitter {
    fn create(&self, record: &NewIssue) -> Result<Issue, SubmitError>;
    fn update(&self, id: IssueId, patch: &IssuePatch) -> Result<Issue, SubmitError>;
}

impl<T: IssueSubmitter + ?Sized> IssueSubmitter for &T {
    fn create(&self, record: &NewIssue) -> Result<Issue, SubmitError> {
        (**self).create(record)
    }

    fn update(&self, id: IssueId, patch: &IssuePatch) -> Result<Issue, SubmitError> {
        (**self).update(id, patch)
    }
}

/// What the form is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    /// New issue form; validated with [`CreateSchema`].
    Create,
    /// Edit form for an existing issue; validated with [`PatchSchema`].
    Edit(IssueId),
}

/// Result of a submission that reached the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved { issue: Issue, redirect: String },
    Failed { message: String },
}

/// Form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    /// Ready for input. Carries the field errors of the last local
    /// validation, if it failed.
    Idle { field_errors: ValidationErrors },
    /// A request is in flight.
    Pending,
    /// The last request finished.
    Settled(SubmitOutcome),
}

impl Default for FormState {
    fn default() -> Self {
        FormState::Idle {
            field_errors: ValidationErrors::default(),
        }
    }
}

impl FormState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FormState::Pending)
    }

    /// The banner message to display, if the last submission failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            FormState::Settled(SubmitOutcome::Failed { message }) => Some(message),
            _ => None,
        }
    }

    /// The route to navigate to, if the last submission succeeded.
    pub fn redirect(&self) -> Option<&str> {
        match self {
            FormState::Settled(SubmitOutcome::Saved { redirect, .. }) => Some(redirect),
            _ => None,
        }
    }
}

/// Shared, mutex-guarded form state. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct FormStateCell {
    inner: Arc<Mutex<FormState>>,
}

impl FormStateCell {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        // The state is plain data; a panic elsewhere cannot leave it half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state.
    pub fn snapshot(&self) -> FormState {
        self.lock().clone()
    }

    /// Move to `Pending` unless a submission is already in flight.
    ///
    /// Returns false if the form was already pending.
    pub fn begin(&self) -> bool {
        let mut state = self.lock();
        if state.is_pending() {
            return false;
        }
        *state = FormState::Pending;
        true
    }

    fn set(&self, next: FormState) -> FormState {
        let mut state = self.lock();
        *state = next.clone();
        next
    }
}

/// Returned when `submit` is called while a submission is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a submission is already in progress")]
pub struct SubmissionInFlight;

/// Issue create/edit form controller.
pub struct IssueForm<C: IssueSubmitter> {
    target: FormTarget,
    submitter: C,
    state: FormStateCell,
}

impl<C: IssueSubmitter> IssueForm<C> {
    pub fn new(target: FormTarget, submitter: C, state: FormStateCell) -> Self {
        Self {
            target,
            submitter,
            state,
        }
    }

    pub fn target(&self) -> FormTarget {
        self.target
    }

    /// Handle to the shared state container.
    pub fn state(&self) -> &FormStateCell {
        &self.state
    }

    /// Validate `payload` and, if it passes, send it.
    ///
    /// Local validation failures never reach the submitter; the form returns
    /// to `Idle` with per-field errors. Every submitter failure collapses to
    /// [`GENERIC_ERROR_MESSAGE`].
    pub fn submit(&self, payload: &Value) -> Result<FormState, SubmissionInFlight> {
        if !self.state.begin() {
            debug!("ignoring submit while a request is pending");
            return Err(SubmissionInFlight);
        }

        let result = match self.target {
            FormTarget::Create => match CreateSchema::validate(payload) {
                Ok(record) => self.submitter.create(&record),
                Err(field_errors) => return Ok(self.back_to_idle(field_errors)),
            },
            FormTarget::Edit(id) => match PatchSchema::validate(payload) {
                Ok(patch) => self.submitter.update(id, &patch),
                Err(field_errors) => return Ok(self.back_to_idle(field_errors)),
            },
        };

        let outcome = match result {
            Ok(issue) => SubmitOutcome::Saved {
                issue,
                redirect: ISSUE_LIST_ROUTE.to_string(),
            },
            Err(err) => {
                warn!(error = %err, "issue submission failed");
                SubmitOutcome::Failed {
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                }
            }
        };
        Ok(self.state.set(FormState::Settled(outcome)))
    }

    fn back_to_idle(&self, field_errors: ValidationErrors) -> FormState {
        self.state.set(FormState::Idle { field_errors })
    }
}
