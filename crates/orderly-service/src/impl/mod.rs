//! Service implementations.
//!
//! Trait definitions live in the parent module (e.g. `order_service.rs`).

pub mod ingest_service_impl;
pub mod order_service_impl;

pub use ingest_service_impl::IngestServiceComponent;
pub use order_service_impl::OrderServiceImpl;

#[cfg(test)]
pub(crate) mod test_support;
