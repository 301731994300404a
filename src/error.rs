use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failures outside the classified validation taxonomy. These degrade to a
/// generic error response instead of a structured send reply.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MalformedBody(detail) => {
                tracing::error!(detail = %detail, "Failed to parse request body");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
