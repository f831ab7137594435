use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No active interview session")]
    NoActiveSession,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("AI service failure: {0}")]
    Ai(String),

    #[error("Report generation failed: {0}")]
    ReportGeneration(String),

    /// The status change it was attached to already succeeded.
    #[error("Notification failed after status changed to {status}: {message}")]
    Notification { status: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NoActiveSession => (
                StatusCode::UNAUTHORIZED,
                "NO_ACTIVE_SESSION",
                "No active interview".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Ai(msg) => {
                tracing::error!("AI service error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "AI_SERVICE_FAILURE",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::ReportGeneration(msg) => {
                tracing::error!("Report generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPORT_GENERATION_FAILED",
                    "The interview report could not be generated".to_string(),
                )
            }
            AppError::Notification { status, message } => {
                tracing::error!("Notification error (status now {status}): {message}");
                (
                    StatusCode::BAD_GATEWAY,
                    "NOTIFICATION_FAILURE",
                    format!("Status updated to {status}, but the email could not be sent"),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
