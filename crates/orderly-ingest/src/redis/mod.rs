//! Redis-backed reliable queue.
//!
//! Producers push onto the head of `{prefix}:queue:{name}`. The consumer
//! atomically moves the tail element into `{prefix}:processing:{name}` and
//! removes it from there once the message is settled.

mod queue;

pub use queue::RedisOrderQueue;

use crate::error::{BrokerError, BrokerResult};
use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use orderly_config::BrokerConfig;
use orderly_core::{HealthCheck, HealthStatus};
use tracing::info;

/// Create a Redis connection pool and verify it with `PING`.
pub async fn create_pool(config: &BrokerConfig) -> BrokerResult<Pool> {
    info!("Creating Redis connection pool for the order queue...");

    let pool = Config::from_url(&config.url)
        .builder()
        .map_err(|e| BrokerError::Configuration(format!("Invalid Redis config: {e}")))?
        .max_size(config.pool_size as usize)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| BrokerError::Configuration(format!("Failed to create pool: {e}")))?;

    ping(&pool).await?;

    info!("Redis connection pool created successfully");
    Ok(pool)
}

async fn ping(pool: &Pool) -> BrokerResult<()> {
    let mut conn = pool.get().await?;
    redis::cmd("PING").query_async::<String>(&mut *conn).await?;
    Ok(())
}

/// Redis key builder for the order queue.
#[derive(Debug, Clone)]
pub struct RedisKeys {
    prefix: String,
}

impl RedisKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Pending messages (list, consumed from the tail).
    #[must_use]
    pub fn queue(&self, queue_name: &str) -> String {
        format!("{}:queue:{}", self.prefix, queue_name)
    }

    /// In-flight messages (list).
    #[must_use]
    pub fn processing(&self, queue_name: &str) -> String {
        format!("{}:processing:{}", self.prefix, queue_name)
    }
}

/// Readiness probe for the broker.
pub struct BrokerHealthCheck {
    pool: Pool,
}

impl BrokerHealthCheck {
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for BrokerHealthCheck {
    async fn check(&self) -> HealthStatus {
        match ping(&self.pool).await {
            Ok(()) => HealthStatus::up("broker"),
            Err(e) => HealthStatus::down("broker", e),
        }
    }
}
