//! Mapping of service errors onto HTTP responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use issues::form::GENERIC_ERROR_MESSAGE;
use issues::{ServiceError, ValidationErrors};
use serde_json::json;

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    /// The request body was not JSON at all.
    MalformedBody(JsonRejection),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Service(ServiceError::Validation(errors)) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            ApiError::MalformedBody(rejection) => {
                tracing::debug!("rejected request body: {}", rejection.body_text());
                let mut errors = ValidationErrors::new();
                errors.add("payload", "Expected a JSON object");
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            ApiError::Service(ServiceError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("Issue {} not found", id) })),
            )
                .into_response(),
            ApiError::Service(ServiceError::Store(e)) => {
                tracing::error!("Store failure: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": GENERIC_ERROR_MESSAGE })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issues::StoreError;

    #[test]
    fn test_status_codes() {
        let mut fields = ValidationErrors::new();
        fields.add("title", "Title is required");
        let cases = [
            (ServiceError::Validation(fields), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("9".to_string()), StatusCode::NOT_FOUND),
            (
                ServiceError::Store(StoreError::Connection("gone".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
