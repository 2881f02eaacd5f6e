use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::{foundation::error::MockupError, workflow::approval::ApproveError};

/// Error type for HTTP handlers, rendered as `{ "error", "code" }` JSON.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] MockupError),

    #[error(transparent)]
    Approve(#[from] ApproveError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = Result<T, AppError>;

fn classify(err: &MockupError) -> (StatusCode, &'static str, String) {
    match err {
        MockupError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        MockupError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        MockupError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        MockupError::External(msg) => (StatusCode::BAD_GATEWAY, "EXTERNAL_ERROR", msg.clone()),
        MockupError::Raster(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "RASTER_ERROR",
            msg.clone(),
        ),
        MockupError::Other(e) => {
            tracing::error!(error = %e, "internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(err) | AppError::Approve(ApproveError::Rejected(err)) => classify(err),
            AppError::Approve(ApproveError::Composition(err)) => {
                let (status, _, message) = classify(err);
                let status = match status {
                    StatusCode::INTERNAL_SERVER_ERROR => status,
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, "COMPOSITION_FAILED", message)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
