//! Cache-aside order lookup.

use async_trait::async_trait;
use orderly_core::{Interface, Order, OrderlyResult};

/// Order lookup service.
#[async_trait]
pub trait OrderService: Interface + Send + Sync {
    /// Returns the order for `order_uid`, consulting the cache first.
    ///
    /// A confirmed absence is `NotFound`; store failures propagate as-is.
    async fn get_order(&self, order_uid: &str) -> OrderlyResult<Order>;

    /// Seeds the cache with the `limit` most recent orders.
    ///
    /// All-or-nothing: if any order fails to load, nothing is cached.
    /// Returns the number of orders cached.
    async fn warm_up(&self, limit: u32) -> OrderlyResult<usize>;
}
