//! Broker error types.

use orderly_core::OrderlyError;
use thiserror::Error;

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Broker-related errors.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool error.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<BrokerError> for OrderlyError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::Configuration(msg) => OrderlyError::Configuration(msg),
            other => OrderlyError::Broker(other.to_string()),
        }
    }
}
