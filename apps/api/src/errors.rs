use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::workflow::resume::ResumeError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    /// The conversation ended in `Failure`.
    #[error("Workflow failed: {reason}")]
    Workflow {
        tool: Option<String>,
        reason: String,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ResumeError> for AppError {
    fn from(e: ResumeError) -> Self {
        match e {
            ResumeError::Unreadable { .. } => AppError::UnprocessableEntity(e.to_string()),
            ResumeError::Storage(_) => AppError::Internal(e.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut extra: Option<(&str, Value)> = None;

        let (status, code, message) = match &self {
            AppError::MissingFields(fields) => {
                extra = Some(("fields", json!(fields)));
                (
                    StatusCode::BAD_REQUEST,
                    "MISSING_FIELDS",
                    self.to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Workflow { tool, reason } => {
                tracing::error!(tool = ?tool, "Workflow failed: {reason}");
                extra = Some(("tool", json!(tool)));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "WORKFLOW_FAILED",
                    reason.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    format!("{e:#}"),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some((key, value)) = extra {
            error[key] = value;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
