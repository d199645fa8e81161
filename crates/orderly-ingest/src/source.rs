//! Message source abstraction.

use async_trait::async_trait;
use orderly_core::OrderlyResult;
use std::time::Duration;

/// A raw message taken from the broker.
///
/// The payload is opaque bytes; decoding belongs to the ingestion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    payload: Vec<u8>,
}

impl BrokerMessage {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Source of ingestion messages with explicit acknowledgement.
///
/// A fetched message stays in flight until it is either acknowledged or
/// handed back with [`redeliver`](MessageSource::redeliver). Messages left
/// in flight by a crashed consumer are returned by
/// [`recover`](MessageSource::recover).
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Waits up to `timeout` for the next message.
    async fn fetch(&self, timeout: Duration) -> OrderlyResult<Option<BrokerMessage>>;

    /// Marks a message as done.
    async fn ack(&self, message: &BrokerMessage) -> OrderlyResult<()>;

    /// Returns a message to the queue so it is fetched again.
    async fn redeliver(&self, message: &BrokerMessage) -> OrderlyResult<()>;

    /// Returns every in-flight message to the queue. Returns the count.
    async fn recover(&self) -> OrderlyResult<u64>;
}
