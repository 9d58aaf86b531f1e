//! HTTP error responses.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meguri::ServiceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Errors that stop the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The persisted workflows could not be loaded.
    #[error("Failed to open workflow store: {0}")]
    Store(#[from] ServiceError),

    /// Binding or serving the listener failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Errors returned by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The service rejected the operation.
    Service(ServiceError),
    /// The request could not be decoded.
    BadRequest(String),
}

impl ApiError {
    /// The status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(error) => match error {
                ServiceError::WorkflowNotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::DuplicateWorkflowId(_) => StatusCode::CONFLICT,
                ServiceError::Workflow(e) if e.is_not_found() => StatusCode::NOT_FOUND,
                ServiceError::Workflow(e) if e.is_conflict() => StatusCode::CONFLICT,
                ServiceError::Workflow(_) | ServiceError::InvalidRequest(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        ApiError::Service(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Service(error) => error.to_string(),
            ApiError::BadRequest(message) => message,
        };
        if status.is_server_error() {
            error!("Request failed: {}", message);
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
