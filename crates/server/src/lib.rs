//! Issue Tracker REST API Server Library
//!
//! Provides the web API over [`issues::IssueService`]: list pages, issue
//! detail, create/patch and the dashboard summary.

pub mod error;
pub mod routes;

use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use issues::errors::{database_unavailable, ActionableError};
use issues::{IssueRepository, IssueService, SqliteStorage};

// Re-export for convenience
pub use error::ApiError;
pub use routes::create_routes;

/// Full application: API routes nested under `/api` with request tracing and
/// permissive CORS for local development.
pub fn build_app<S: IssueRepository + 'static>(service: Arc<IssueService<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", create_routes(service))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Open the SQLite database at `path` and bring its schema up to date.
pub fn open_database(path: &Path) -> Result<SqliteStorage, ActionableError> {
    let storage =
        SqliteStorage::open(path).map_err(|e| database_unavailable(path, &e.to_string()))?;
    storage
        .init()
        .map_err(|e| database_unavailable(path, &e.to_string()))?;
    Ok(storage)
}
