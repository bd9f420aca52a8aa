use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::core::elevenlabs::SignedUrlError;

/// Application error type
#[derive(Debug)]
pub enum AppError {
    InternalServerError(String),
    BadRequest(String),
    /// An upstream vendor API failed
    BadGateway(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                msg
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                msg
            }
            AppError::BadGateway(msg) => {
                tracing::error!("Upstream error: {}", msg);
                msg
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg) => write!(f, "Internal server error: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            AppError::BadGateway(msg) => write!(f, "Bad gateway: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<SignedUrlError> for AppError {
    fn from(err: SignedUrlError) -> Self {
        match err {
            SignedUrlError::MissingApiKey => AppError::InternalServerError(err.to_string()),
            SignedUrlError::MissingAgentId => AppError::BadRequest(err.to_string()),
            SignedUrlError::Upstream { .. } | SignedUrlError::Http(_) => {
                AppError::BadGateway(err.to_string())
            }
        }
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
