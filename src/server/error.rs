use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::errors::JobtowerError;

/// HTTP-facing error: a status code plus a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl From<JobtowerError> for ApiError {
    fn from(err: JobtowerError) -> Self {
        let status = match &err {
            JobtowerError::UnknownJob(_) => StatusCode::NOT_FOUND,
            JobtowerError::AlreadyRunning(_) => StatusCode::CONFLICT,
            other => {
                error!(error = %other, "internal error while handling request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
