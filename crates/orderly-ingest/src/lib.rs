//! # Orderly Ingest
//!
//! Broker side of the ingestion path: a [`MessageSource`] abstraction over
//! the message broker, its Redis reliable-queue implementation, and the
//! [`IngestConsumer`] loop that feeds each message through the
//! [`IngestService`](orderly_service::IngestService) and decides whether to
//! acknowledge it or hand it back for redelivery.
//!
//! ## Delivery semantics
//!
//! Delivery is at-least-once. A message is acknowledged once it has been
//! persisted or definitively rejected; transient failures return it to the
//! queue. Re-delivery of an already persisted order is an idempotent
//! overwrite.

pub mod consumer;
pub mod error;
pub mod metrics;
pub mod redis;
pub mod source;

pub use consumer::{ConsumerConfig, ConsumerStats, Disposition, IngestConsumer};
pub use error::{BrokerError, BrokerResult};
pub use self::redis::{create_pool, BrokerHealthCheck, RedisKeys, RedisOrderQueue};
pub use source::{BrokerMessage, MessageSource};
