//! API route definitions

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use issues::{Issue, IssuePage, IssueRepository, IssueService, RawListQuery, StatusSummary};

use crate::error::ApiError;

/// Shared application state
pub type AppState<S> = Arc<IssueService<S>>;

/// Create API routes
pub fn create_routes<S: IssueRepository + 'static>(service: Arc<IssueService<S>>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/issues", get(list_issues).post(create_issue))
        .route("/issues/latest", get(latest_issues))
        .route("/issues/:id", get(get_issue).patch(update_issue))
        .route("/summary", get(get_summary))
        .with_state(service)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "issues-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// One page of the issue list.
///
/// Query parameters are taken as raw strings; anything unusable is
/// normalized away rather than rejected.
async fn list_issues<S: IssueRepository>(
    Query(params): Query<HashMap<String, String>>,
    State(service): State<AppState<S>>,
) -> Result<Json<IssuePage>, ApiError> {
    let raw = RawListQuery::from_params(&params);
    Ok(Json(service.list_page(&raw)?))
}

async fn create_issue<S: IssueRepository>(
    State(service): State<AppState<S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Issue>), ApiError> {
    let Json(payload) = body?;
    let issue = service.create_issue(&payload)?;
    Ok((StatusCode::CREATED, Json(issue)))
}

/// Most recently created issues; `limit` falls back to the configured default
/// when missing or not a number.
async fn latest_issues<S: IssueRepository>(
    Query(params): Query<HashMap<String, String>>,
    State(service): State<AppState<S>>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let limit = params
        .get("limit")
        .and_then(|raw| raw.trim().parse::<usize>().ok());
    Ok(Json(service.latest_issues(limit)?))
}

/// Get single issue by ID
async fn get_issue<S: IssueRepository>(
    Path(id): Path<String>,
    State(service): State<AppState<S>>,
) -> Result<Json<Issue>, ApiError> {
    Ok(Json(service.show_issue(&id)?))
}

async fn update_issue<S: IssueRepository>(
    Path(id): Path<String>,
    State(service): State<AppState<S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Issue>, ApiError> {
    let Json(payload) = body?;
    Ok(Json(service.update_issue(&id, &payload)?))
}

/// Per-status counts
async fn get_summary<S: IssueRepository>(
    State(service): State<AppState<S>>,
) -> Result<Json<StatusSummary>, ApiError> {
    Ok(Json(service.status_summary()?))
}
