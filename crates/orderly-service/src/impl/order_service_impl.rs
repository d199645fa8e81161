//! Cache-aside order service implementation.

use crate::cache::TtlCache;
use crate::metrics::CacheMetrics;
use crate::order_service::OrderService;
use async_trait::async_trait;
use orderly_core::{Order, OrderlyError, OrderlyResult};
use orderly_repository::OrderRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Order service backed by a [`TtlCache`] in front of the repository.
///
/// Concurrent misses on the same key each read the store and each populate
/// the cache; the last write wins.
pub struct OrderServiceImpl {
    repository: Arc<dyn OrderRepository>,
    cache: Arc<TtlCache<Order>>,
    warmup_ttl: Duration,
}

impl OrderServiceImpl {
    /// Creates a new order service.
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        cache: Arc<TtlCache<Order>>,
        warmup_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            warmup_ttl,
        }
    }

    /// Returns the underlying cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<TtlCache<Order>> {
        &self.cache
    }

    async fn hydrate(&self, header: orderly_core::OrderHeader) -> OrderlyResult<Order> {
        let uid = header.uid.clone();
        let (delivery, payment, items) = futures::try_join!(
            self.repository.find_delivery(&uid),
            self.repository.find_payment(&uid),
            self.repository.find_items(&uid),
        )?;
        Ok(Order::from_parts(header, delivery, payment, items))
    }
}

#[async_trait]
impl OrderService for OrderServiceImpl {
    async fn get_order(&self, order_uid: &str) -> OrderlyResult<Order> {
        if let Some(order) = self.cache.get(order_uid) {
            CacheMetrics::hit();
            debug!(order_uid = %order_uid, "Cache hit");
            return Ok(order);
        }
        CacheMetrics::miss();
        debug!(order_uid = %order_uid, "Cache miss");

        if !self.repository.exists(order_uid).await? {
            return Err(OrderlyError::not_found("Order", order_uid));
        }

        let order = self.repository.find_by_uid(order_uid).await?;
        self.cache.set(order_uid, order.clone(), Duration::ZERO);
        Ok(order)
    }

    async fn warm_up(&self, limit: u32) -> OrderlyResult<usize> {
        let headers = self.repository.find_recent(limit).await?;

        let mut orders = Vec::with_capacity(headers.len());
        for header in headers {
            orders.push(self.hydrate(header).await?);
        }

        let count = orders.len();
        for order in orders {
            self.cache.set(order.uid.clone(), order, self.warmup_ttl);
        }

        CacheMetrics::warmed(count);
        info!(count, ttl_secs = self.warmup_ttl.as_secs(), "Cache warmed up");
        Ok(count)
    }
}

impl std::fmt::Debug for OrderServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderServiceImpl")
            .field("cache", &self.cache)
            .field("warmup_ttl", &self.warmup_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DEFAULT_TTL, WARMUP_TTL};
    use crate::r#impl::test_support::{sample_order, InMemoryOrderRepository};
    use mockall::mock;
    use orderly_core::{Delivery, Item, OrderHeader, Payment};
    use std::sync::atomic::Ordering;

    mock! {
        pub Repo {}

        #[async_trait]
        impl OrderRepository for Repo {
            async fn exists(&self, order_uid: &str) -> OrderlyResult<bool>;
            async fn find_by_uid(&self, order_uid: &str) -> OrderlyResult<Order>;
            async fn find_recent(&self, limit: u32) -> OrderlyResult<Vec<OrderHeader>>;
            async fn find_delivery(&self, order_uid: &str) -> OrderlyResult<Delivery>;
            async fn find_payment(&self, order_uid: &str) -> OrderlyResult<Payment>;
            async fn find_items(&self, order_uid: &str) -> OrderlyResult<Vec<Item>>;
            async fn save(&self, order: &Order) -> OrderlyResult<()>;
        }
    }

    fn service(repo: Arc<dyn OrderRepository>) -> OrderServiceImpl {
        let cache = Arc::new(TtlCache::new(DEFAULT_TTL, Duration::ZERO));
        OrderServiceImpl::new(repo, cache, WARMUP_TTL)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let repo = Arc::new(InMemoryOrderRepository::with_orders(vec![sample_order("ORD1", 0)]));
        let service = service(repo.clone());

        let first = service.get_order("ORD1").await.unwrap();
        assert_eq!(first.uid, "ORD1");
        assert_eq!(repo.find_by_uid_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.cache().get("ORD1"), Some(first.clone()));

        let second = service.get_order("ORD1").await.unwrap();
        assert_eq!(second, first);
        assert_eq!(repo.exists_calls.load(Ordering::SeqCst), 1);
        assert_eq!(repo.find_by_uid_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_key_is_not_found_and_not_cached() {
        let repo = Arc::new(InMemoryOrderRepository::default());
        let service = service(repo.clone());

        let err = service.get_order("ghost").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(service.cache().is_empty());
        assert_eq!(repo.find_by_uid_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_populated_entry_uses_default_ttl() {
        let repo = Arc::new(InMemoryOrderRepository::with_orders(vec![sample_order("ORD1", 0)]));
        let service = service(repo.clone());

        service.get_order("ORD1").await.unwrap();
        tokio::time::advance(DEFAULT_TTL).await;
        service.get_order("ORD1").await.unwrap();
        assert_eq!(repo.find_by_uid_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exists_failure_propagates_unmodified() {
        let mut repo = MockRepo::new();
        repo.expect_exists()
            .times(1)
            .returning(|_| Err(OrderlyError::StoreUnavailable("connection refused".into())));
        repo.expect_find_by_uid().never();

        let service = service(Arc::new(repo));
        let err = service.get_order("ORD1").await.unwrap_err();
        assert!(matches!(err, OrderlyError::StoreUnavailable(_)));
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_unmodified() {
        let mut repo = MockRepo::new();
        repo.expect_exists().times(1).returning(|_| Ok(true));
        repo.expect_find_by_uid()
            .times(1)
            .returning(|_| Err(OrderlyError::Database("relation does not exist".into())));

        let service = service(Arc::new(repo));
        let err = service.get_order("ORD1").await.unwrap_err();
        assert!(matches!(err, OrderlyError::Database(_)));
        assert!(service.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_warm_up_seeds_recent_orders_with_warmup_ttl() {
        let orders = (0..15).map(|i| sample_order(&format!("ORD{i}"), i)).collect();
        let repo = Arc::new(InMemoryOrderRepository::with_orders(orders));
        let service = service(repo.clone());

        let warmed = service.warm_up(10).await.unwrap();
        assert_eq!(warmed, 10);
        assert_eq!(service.cache().len(), 10);
        assert!(service.cache().get("ORD14").is_some());
        assert!(service.cache().get("ORD4").is_none());
        assert_eq!(repo.sub_record_calls.load(Ordering::SeqCst), 30);

        let cached = service.cache().get("ORD14").unwrap();
        assert_eq!(cached.items.len(), 1);
        assert_eq!(cached.payment.amount, 1500);

        tokio::time::advance(WARMUP_TTL).await;
        assert!(service.cache().get("ORD14").is_none());
    }

    #[tokio::test]
    async fn test_warm_up_is_all_or_nothing() {
        let orders = (0..5).map(|i| sample_order(&format!("ORD{i}"), i)).collect();
        let repo = Arc::new(InMemoryOrderRepository::with_orders(orders));
        repo.fail_payment_for("ORD1");
        let service = service(repo);

        let err = service.warm_up(10).await.unwrap_err();
        assert!(matches!(err, OrderlyError::StoreUnavailable(_)));
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_warm_up_empty_store() {
        let service = service(Arc::new(InMemoryOrderRepository::default()));
        assert_eq!(service.warm_up(10).await.unwrap(), 0);
    }
}
