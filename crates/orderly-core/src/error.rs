//! Unified error types for all layers of the application.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for all layers of Orderly.
///
/// The variants separate "confirmed absent" from "unreachable" so that
/// callers, and the ingestion consumer in particular, can decide whether a
/// failure is terminal or worth another delivery attempt.
#[derive(Error, Debug)]
pub enum OrderlyError {
    // ============ Domain Errors ============
    /// Resource confirmed absent in the durable store.
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation gate rejection, scoped to the offending field path.
    #[error("Invalid entity: {field}: {message}")]
    InvalidEntity { field: String, message: String },

    /// Malformed inbound payload.
    #[error("Parse failure: {0}")]
    Parse(String),

    // ============ Infrastructure Errors ============
    /// Durable store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Durable store rejected a statement.
    #[error("Database error: {0}")]
    Database(String),

    /// Message broker failure.
    #[error("Broker error: {0}")]
    Broker(String),

    /// Operation exceeded its deadline.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrderlyError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::InvalidEntity { .. } | Self::Parse(_) => 400,
            Self::StoreUnavailable(_) | Self::Broker(_) | Self::Timeout(_) => 503,
            Self::Database(_) | Self::Configuration(_) | Self::Internal(_) | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidEntity { .. } => "INVALID_ENTITY",
            Self::Parse(_) => "PARSE_FAILURE",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Broker(_) => "BROKER_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates an invalid entity error for a field path.
    #[must_use]
    pub fn invalid_entity(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEntity {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a parse failure.
    #[must_use]
    pub fn parse<T: Into<String>>(message: T) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the field path of an `InvalidEntity` error.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidEntity { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Returns true if this error signals a confirmed absence.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this error is retriable.
    ///
    /// Retriable errors are transient and not attributable to message
    /// content; the ingestion consumer leaves such messages for redelivery.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::Broker(_) | Self::Timeout(_)
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for OrderlyError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            // Raised client-side for statements with more binds than the
            // wire format allows; the statement itself is at fault.
            sqlx::Error::Protocol(message) if message.contains("too many arguments") => {
                Self::Database(err.to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::StoreUnavailable(err.to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for OrderlyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    /// Field path
    pub field: String,
    /// Error message
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response from an `OrderlyError`.
    #[must_use]
    pub fn from_error(error: &OrderlyError) -> Self {
        let details = match error {
            OrderlyError::InvalidEntity { field, message } => Some(vec![FieldError {
                field: field.clone(),
                message: message.clone(),
            }]),
            _ => None,
        };

        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl From<&OrderlyError> for ErrorResponse {
    fn from(error: &OrderlyError) -> Self {
        Self::from_error(error)
    }
}
