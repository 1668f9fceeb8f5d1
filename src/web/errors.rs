//! # Web API Error Types
//!
//! Error responses of the HTTP API. Every error renders as
//! `{"error": {"code": ..., "message": ...}}` with a matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::RelayError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Service temporarily unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Database operation failed: {operation}")]
    DatabaseError { operation: String },

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn database_error(operation: impl Into<String>) -> Self {
        Self::DatabaseError {
            operation: operation.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::DatabaseError { .. } | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (error_code, message) = match &self {
            ApiError::Unauthorized => ("UNAUTHORIZED", "Authentication required"),
            ApiError::BadRequest { message } => ("BAD_REQUEST", message.as_str()),
            ApiError::ServiceUnavailable { message } => ("SERVICE_UNAVAILABLE", message.as_str()),
            ApiError::DatabaseError { operation } => ("DATABASE_ERROR", operation.as_str()),
            ApiError::Internal => ("INTERNAL_ERROR", "Internal server error"),
        };

        let error_response = json!({
            "error": {
                "code": error_code,
                "message": message
            }
        });

        (self.status_code(), Json(error_response)).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::MalformedMessage { .. } | RelayError::InvalidOrder { .. } => {
                ApiError::bad_request(err.to_string())
            }
            RelayError::Messaging(e) => {
                error!(error = %e, "Queue operation failed");
                ApiError::service_unavailable("Order queue unavailable")
            }
            RelayError::Storage { operation, message } => {
                error!(operation = %operation, error = %message, "Storage operation failed");
                ApiError::database_error(operation)
            }
            other => {
                error!(error = %other, "Unhandled relay error");
                ApiError::Internal
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
