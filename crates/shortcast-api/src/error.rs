//! API error types.
//!
//! Library errors are logged here, once, when they become a response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shortcast_catalog::CatalogError;
use shortcast_media::MediaError;
use thiserror::Error;
use tracing::{error, warn};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Media could not be signed or fetched from object storage.
    #[error("Object unavailable")]
    ObjectUnavailable(#[source] MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ObjectUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::InvalidKey => ApiError::bad_request("Invalid object key"),
            MediaError::InvalidConfig(msg) => ApiError::Internal(msg),
            e if e.is_not_found() => ApiError::not_found("Object not found"),
            e => ApiError::ObjectUnavailable(e),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(_) => ApiError::not_found("Podcast not found"),
            CatalogError::Forbidden(msg) => ApiError::Forbidden(msg),
            CatalogError::Validation(msg) => ApiError::Validation(msg),
            CatalogError::Repository(msg) => ApiError::Internal(msg),
            CatalogError::Media(e) => e.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (detail, code) = match &self {
            ApiError::ObjectUnavailable(source) => {
                warn!(error = %source, "Media resolution failed");
                (
                    "object unavailable".to_string(),
                    Some("object_unavailable".to_string()),
                )
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                // Don't expose internal error details in production
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    ("An internal error occurred".to_string(), None)
                } else {
                    (self.to_string(), None)
                }
            }
            _ => (self.to_string(), None),
        };

        let body = ErrorResponse { detail, code };

        (status, Json(body)).into_response()
    }
}
