//! # Orderly Service
//!
//! Service layer for Orderly: the in-memory TTL cache, the cache-aside
//! order lookup with its start-up warm-up, and the ingestion pipeline that
//! turns raw payloads into persisted orders.

pub mod cache;
pub mod ingest_service;
pub mod metrics;
pub mod order_service;
pub mod r#impl;

pub use cache::*;
pub use ingest_service::*;
pub use order_service::*;
pub use r#impl::{IngestServiceComponent, OrderServiceImpl};
