use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::ApiResponse;

/// AppError
///
/// The single failure type flowing out of handlers and the repository.
/// Client-side problems (bad input, duplicates, missing identity, unknown ids) carry
/// a human-readable message; infrastructure failures wrap the underlying error and
/// surface its text verbatim in the `error` field of the response envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// A write collided with a unique field (admin email, category name).
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// The media host rejected an upload or deletion.
    #[error("media storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Hashing(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("invalid multipart payload: {0}")]
    Multipart(#[from] MultipartError),

    /// A blocking task (password hashing) panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) | AppError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_)
            | AppError::Database(_)
            | AppError::Hashing(_)
            | AppError::Token(_)
            | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for the 401 returned by every protected operation.
    pub fn admin_required() -> Self {
        AppError::Unauthorized("Unauthorized: Admin authentication required".to_string())
    }
}

impl From<ValidationErrors> for AppError {
    /// Joins the distinct field messages, ordered by field name.
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let mut messages: Vec<String> = Vec::new();
        for error in fields.into_iter().flat_map(|(_, errors)| errors.iter()) {
            let message = error
                .message
                .as_ref()
                .map_or_else(|| error.code.to_string(), |m| m.to_string());
            if !messages.contains(&message) {
                messages.push(message);
            }
        }
        AppError::Validation(messages.join(", "))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            ApiResponse::<()>::failure("Server error").with_error(self.to_string())
        } else {
            ApiResponse::<()>::failure(self.to_string())
        };
        (status, Json(body)).into_response()
    }
}
