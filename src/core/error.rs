use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    /// Backing store unreachable or timed out. Surfaced as-is, never retried here.
    #[error("Not available: {0}")]
    NotAvailable(String),

    /// Attempt to persist an empty customization. Only reachable when a caller
    /// bypasses the customization lifecycle, so it is reported as a server fault.
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidContent(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, errors) = match self {
            AppError::NotAvailable(ref msg) => {
                tracing::error!("Store not available: {}", msg);
                (
                    "Prompt storage is temporarily unavailable".to_string(),
                    None,
                )
            }
            AppError::InvalidContent(ref msg) => {
                tracing::error!("Invalid content reached the store: {}", msg);
                ("Internal server error".to_string(), None)
            }
            AppError::NotFound(ref msg) => (msg.clone(), None),
            AppError::Validation(ref msg) => (msg.clone(), Some(vec![msg.clone()])),
            AppError::BadRequest(ref msg) => (msg.clone(), None),
            AppError::Unauthorized(ref msg) => (msg.clone(), None),
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
