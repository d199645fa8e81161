//! Ingestion pipeline: parse, validate, persist.

use async_trait::async_trait;
use orderly_core::{Interface, OrderlyResult};

/// Order ingestion service.
#[async_trait]
pub trait IngestService: Interface + Send + Sync {
    /// Ingests one raw payload and returns the persisted order's key.
    ///
    /// Fails with `Parse` for malformed JSON, `InvalidEntity` when the
    /// validation gate rejects the order, and with the store's error if
    /// persistence fails. The cache is not touched.
    async fn ingest(&self, payload: &[u8]) -> OrderlyResult<String>;
}
