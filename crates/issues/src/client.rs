//! Blocking HTTP client for the issue API.
//!
//! Implements [`IssueSubmitter`] so an [`IssueForm`](crate::form::IssueForm)
//! can post to a running server.

use crate::domain::{Issue, IssueId, IssuePatch, NewIssue};
use crate::form::{IssueSubmitter, SubmitError};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Talks to `{base_url}/api/issues`.
#[derive(Debug, Clone)]
pub struct HttpIssueClient {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpIssueClient {
    /// Client for the server at `base_url`, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/api/issues", self.base_url)
    }

    fn issue_url(&self, id: IssueId) -> String {
        format!("{}/api/issues/{}", self.base_url, id)
    }
}

fn request_error(err: ureq::Error) -> SubmitError {
    match err {
        ureq::Error::StatusCode(code) => SubmitError::Status(code),
        other => SubmitError::Transport(other.to_string()),
    }
}

fn read_issue(mut response: ureq::http::Response<ureq::Body>) -> Result<Issue, SubmitError> {
    response
        .body_mut()
        .read_json::<Issue>()
        .map_err(|e| SubmitError::Decode(e.to_string()))
}

impl IssueSubmitter for HttpIssueClient {
    fn create(&self, record: &NewIssue) -> Result<Issue, SubmitError> {
        let url = self.collection_url();
        debug!(%url, "POST issue");
        let response = self
            .agent
            .post(&url)
            .send_json(record)
            .map_err(request_error)?;
        read_issue(response)
    }

    fn update(&self, id: IssueId, patch: &IssuePatch) -> Result<Issue, SubmitError> {
        let url = self.issue_url(id);
        debug!(%url, "PATCH issue");
        let response = self
            .agent
            .patch(&url)
            .send_json(patch)
            .map_err(request_error)?;
        read_issue(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = HttpIssueClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.collection_url(), "http://localhost:3000/api/issues");
        assert_eq!(client.issue_url(7), "http://localhost:3000/api/issues/7");
    }

    #[test]
    fn test_status_error_keeps_code() {
        assert!(matches!(
            request_error(ureq::Error::StatusCode(400)),
            SubmitError::Status(400)
        ));
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is normally closed
        let client = HttpIssueClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2));
        let result = client.create(&NewIssue {
            title: "t".to_string(),
            description: "d".to_string(),
        });
        assert!(matches!(result, Err(SubmitError::Transport(_))));
    }
}
