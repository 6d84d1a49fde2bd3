//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request metadata, such as identity headers.
    #[error("{0}")]
    BadRequest(String),
    /// Error raised by a handler or service.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::InputNotValid { .. } => StatusCode::BAD_REQUEST,
        DomainError::OperationNotValid { .. } | DomainError::ResourceAlreadyExists { .. } => {
            StatusCode::CONFLICT
        }
        DomainError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden { .. } => StatusCode::FORBIDDEN,
        DomainError::Repository { .. } | DomainError::Mapping { .. } => {
            tracing::error!(error = %err, "internal server error");
            return (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string());
        }
    };
    (status, err.to_string())
}
