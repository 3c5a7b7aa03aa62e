use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::record::ResumeRecord;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The analyzer did not produce a résumé. Surfaced as an upstream failure.
    #[error("Analysis error: {message}")]
    Analysis {
        message: String,
        partial: Option<Box<ResumeRecord>>,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                error_body(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
            }
            AppError::Extraction(msg) => {
                tracing::error!("Extraction error: {msg}");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "EXTRACTION_ERROR", msg)
            }
            AppError::Analysis { message, partial } => {
                tracing::warn!("Analysis error: {message}");
                let mut error = json!({
                    "code": "ANALYSIS_ERROR",
                    "message": message,
                });
                if let Some(record) = partial {
                    error["partial"] = json!(record);
                    error["extraction_method"] = json!("fallback");
                }
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": error }))).into_response()
            }
        }
    }
}

fn error_body(status: StatusCode, code: &str, message: String) -> Response {
    let body = Json(json!({
        "error": {
            "code": code,
            "message": message
        }
    }));

    (status, body).into_response()
}
