//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::age::AgeError;
use crate::notify::NotifyError;
use crate::store::StoreError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// No credentials supplied for an admin route
    #[error("Authentication required")]
    Unauthorized,

    /// Credentials supplied but wrong (or admin access not configured)
    #[error("Forbidden")]
    Forbidden,

    /// Age index error
    #[error(transparent)]
    Age(#[from] AgeError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Outbound webhook failed
    #[error("Webhook failed: {0}")]
    Notify(#[from] NotifyError),

    /// A feature needed for this request is not configured
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Age(e) => match e {
                AgeError::InvalidId(_) => (StatusCode::BAD_REQUEST, "INVALID_STRUCTURE_ID"),
                AgeError::NotLoaded => (StatusCode::SERVICE_UNAVAILABLE, "AGE_INDEX_NOT_LOADED"),
                AgeError::NotEstimable(_) => (StatusCode::NOT_FOUND, "NOT_ESTIMABLE"),
                AgeError::SourceUnavailable { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, "AGE_SOURCE_UNAVAILABLE")
                }
            },
            ApiError::Store(StoreError::InvalidJCode(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_JCODE")
            }
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Notify(_) => (StatusCode::BAD_GATEWAY, "WEBHOOK_FAILED"),
            ApiError::NotConfigured(_) => (StatusCode::INTERNAL_SERVER_ERROR, "NOT_CONFIGURED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, ApiError::Unauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Basic realm=\"admin\""),
            );
        }
        response
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
