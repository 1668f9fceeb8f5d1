//! # Relay Error Types
//!
//! Crate-level error handling for the order relay. Queue-level failures keep
//! their own [`MessagingError`] and are wrapped here so handlers can use `?`
//! across storage and messaging calls.

use crate::messaging::MessagingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Malformed message: {message}")]
    MalformedMessage { message: String },

    #[error("Invalid order: {field}: {reason}")]
    InvalidOrder { field: String, reason: String },

    #[error("Storage error: {operation}: {message}")]
    Storage { operation: String, message: String },

    #[error("Concurrency conflict on order {order_id}: version token changed since read")]
    ConcurrencyConflict { order_id: String },

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RelayError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: message.into(),
        }
    }

    pub fn invalid_order(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOrder {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn conflict(order_id: impl Into<String>) -> Self {
        Self::ConcurrencyConflict {
            order_id: order_id.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Errors caused by the content of the input rather than the environment.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::MalformedMessage { .. } | Self::InvalidOrder { .. }
        )
    }
}

impl From<sqlx::Error> for RelayError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RelayError::storage("query", "No rows found"),
            sqlx::Error::PoolTimedOut => RelayError::storage("pool", "Timed out acquiring connection"),
            other => RelayError::storage("database", other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for RelayError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        RelayError::storage("migrate", err.to_string())
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
