//! Mapping from library errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fintrack_core::{RepoError, StoreError};
use serde_json::json;

use super::password::BcryptError;

/// Error returned by handlers. Every variant renders as
/// `{ "sucesso": false, "mensagem": ..., "erro"?: ... }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    /// Store or runtime failure. The detail is surfaced for diagnostics.
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg) => write!(f, "{}", msg),
            ApiError::Internal(detail) => write!(f, "Internal server error: {}", detail),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                json!({
                    "sucesso": false,
                    "mensagem": "Internal server error",
                    "erro": detail,
                })
            }
            other => json!({
                "sucesso": false,
                "mensagem": other.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Validation(msg) => ApiError::BadRequest(msg),
            RepoError::NotFound(label) => ApiError::NotFound(format!("{} not found", label)),
            RepoError::Forbidden => ApiError::Forbidden("Access denied".to_string()),
            RepoError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<BcryptError> for ApiError {
    fn from(e: BcryptError) -> Self {
        ApiError::Internal(format!("password hashing failed: {}", e))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("background task failed: {}", e))
    }
}
