//! Redis order queue implementation.

use super::RedisKeys;
use crate::error::BrokerResult;
use crate::source::{BrokerMessage, MessageSource};
use async_trait::async_trait;
use deadpool_redis::Pool;
use orderly_config::BrokerConfig;
use orderly_core::OrderlyResult;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Redis reliable queue carrying raw order payloads.
pub struct RedisOrderQueue {
    pool: Pool,
    queue_key: String,
    processing_key: String,
}

impl RedisOrderQueue {
    /// Create a new queue over `pool`.
    pub fn new(pool: Pool, config: &BrokerConfig) -> Self {
        let keys = RedisKeys::new(&config.key_prefix);
        Self {
            pool,
            queue_key: keys.queue(&config.queue),
            processing_key: keys.processing(&config.queue),
        }
    }

    async fn conn(&self) -> BrokerResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    /// Push a payload onto the queue. Returns the queue length.
    pub async fn publish(&self, payload: &[u8]) -> OrderlyResult<u64> {
        let mut conn = self.conn().await?;
        let len: u64 = conn
            .lpush(&self.queue_key, payload)
            .await
            .map_err(crate::BrokerError::from)?;
        debug!(queue = %self.queue_key, bytes = payload.len(), "Published message");
        Ok(len)
    }

    /// Number of pending messages.
    pub async fn pending(&self) -> OrderlyResult<u64> {
        let mut conn = self.conn().await?;
        let len: u64 = conn
            .llen(&self.queue_key)
            .await
            .map_err(crate::BrokerError::from)?;
        Ok(len)
    }

    /// Number of in-flight messages.
    pub async fn in_flight(&self) -> OrderlyResult<u64> {
        let mut conn = self.conn().await?;
        let len: u64 = conn
            .llen(&self.processing_key)
            .await
            .map_err(crate::BrokerError::from)?;
        Ok(len)
    }

    async fn blocking_move(&self, timeout: Duration) -> BrokerResult<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        let moved = redis::cmd("BLMOVE")
            .arg(&self.queue_key)
            .arg(&self.processing_key)
            .arg("RIGHT")
            .arg("LEFT")
            .arg(timeout.as_secs_f64())
            .query_async::<Option<Vec<u8>>>(&mut *conn)
            .await?;
        Ok(moved)
    }

    async fn settle(&self, message: &BrokerMessage, requeue: bool) -> BrokerResult<()> {
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.atomic().lrem(&self.processing_key, 1, message.payload());
        if requeue {
            pipe.rpush(&self.queue_key, message.payload());
        }
        let _: () = pipe.query_async(&mut *conn).await?;
        Ok(())
    }

    async fn drain_processing(&self) -> BrokerResult<u64> {
        let mut conn = self.conn().await?;
        let mut recovered = 0u64;
        // Newest first, so the oldest ends up at the consume end.
        loop {
            let moved = redis::cmd("LMOVE")
                .arg(&self.processing_key)
                .arg(&self.queue_key)
                .arg("LEFT")
                .arg("RIGHT")
                .query_async::<Option<Vec<u8>>>(&mut *conn)
                .await?;
            if moved.is_none() {
                break;
            }
            recovered += 1;
        }
        Ok(recovered)
    }
}

#[async_trait]
impl MessageSource for RedisOrderQueue {
    async fn fetch(&self, timeout: Duration) -> OrderlyResult<Option<BrokerMessage>> {
        let payload = self.blocking_move(timeout).await?;
        Ok(payload.map(BrokerMessage::new))
    }

    async fn ack(&self, message: &BrokerMessage) -> OrderlyResult<()> {
        self.settle(message, false).await?;
        Ok(())
    }

    async fn redeliver(&self, message: &BrokerMessage) -> OrderlyResult<()> {
        self.settle(message, true).await?;
        Ok(())
    }

    async fn recover(&self) -> OrderlyResult<u64> {
        let recovered = self.drain_processing().await?;
        if recovered > 0 {
            warn!(count = recovered, queue = %self.queue_key, "Recovered in-flight messages");
        } else {
            info!(queue = %self.queue_key, "No in-flight messages to recover");
        }
        Ok(recovered)
    }
}

impl std::fmt::Debug for RedisOrderQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisOrderQueue")
            .field("queue_key", &self.queue_key)
            .field("processing_key", &self.processing_key)
            .finish_non_exhaustive()
    }
}
