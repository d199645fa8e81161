//! Repository trait definitions.

use async_trait::async_trait;
use orderly_core::{Delivery, Interface, Item, Order, OrderHeader, OrderlyResult, Payment};

/// Order repository trait.
///
/// Absent rows surface as `OrderlyError::NotFound`; connectivity failures
/// surface as `OrderlyError::StoreUnavailable`.
#[async_trait]
pub trait OrderRepository: Interface + Send + Sync {
    /// Checks whether an order with this key exists.
    async fn exists(&self, order_uid: &str) -> OrderlyResult<bool>;

    /// Loads the full aggregate in one consistent snapshot.
    async fn find_by_uid(&self, order_uid: &str) -> OrderlyResult<Order>;

    /// Returns up to `limit` root records, newest `date_created` first.
    async fn find_recent(&self, limit: u32) -> OrderlyResult<Vec<OrderHeader>>;

    async fn find_delivery(&self, order_uid: &str) -> OrderlyResult<Delivery>;

    async fn find_payment(&self, order_uid: &str) -> OrderlyResult<Payment>;

    /// Returns the items in their original order.
    async fn find_items(&self, order_uid: &str) -> OrderlyResult<Vec<Item>>;

    /// Persists the aggregate atomically, overwriting any previous version.
    async fn save(&self, order: &Order) -> OrderlyResult<()>;
}
