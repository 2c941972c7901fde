use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The dialogue path never constructs these for model or dispatch failures —
/// those fold into safe fallback text before reaching the handler. Only
/// input rejection and the scheduling collaborators surface errors here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Scheduling failures deliberately surface their raw error text; the
    /// calendar collaborators are not security-sensitive.
    #[error("Scheduling error: {0}")]
    Scheduling(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Scheduling(msg) => {
                tracing::error!("Scheduling error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SCHEDULING_ERROR",
                    msg.clone(),
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
