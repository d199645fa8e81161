//! Ingestion service implementation.

use crate::ingest_service::IngestService;
use async_trait::async_trait;
use orderly_core::{validate_order, Order, OrderlyResult};
use orderly_repository::OrderRepository;
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info};

/// Ingestion service wired through the DI container.
#[derive(Component)]
#[shaku(interface = IngestService)]
pub struct IngestServiceComponent {
    #[shaku(inject)]
    repository: Arc<dyn OrderRepository>,
}

impl IngestServiceComponent {
    /// Creates an ingestion service outside of the container.
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl IngestService for IngestServiceComponent {
    async fn ingest(&self, payload: &[u8]) -> OrderlyResult<String> {
        let order: Order = serde_json::from_slice(payload)?;
        debug!(order_uid = %order.uid, items = order.items.len(), "Payload decoded");

        validate_order(&order)?;

        self.repository.save(&order).await?;
        info!(order_uid = %order.uid, "Order persisted");
        Ok(order.uid)
    }
}

impl std::fmt::Debug for IngestServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestServiceComponent").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::order_service::OrderService;
    use crate::r#impl::test_support::{sample_order, InMemoryOrderRepository};
    use crate::r#impl::OrderServiceImpl;
    use orderly_core::OrderlyError;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const SAMPLE_PAYLOAD: &str = r#"{
        "order_uid": "b563feb7b2b84b6test",
        "track_number": "WBILMTESTTRACK",
        "entry": "WBIL",
        "delivery": {
            "name": "Test Testov",
            "phone": "+9720000000",
            "zip": "2639809",
            "city": "Kiryat Mozkin",
            "address": "Ploshad Mira 15",
            "region": "Kraiot",
            "email": "test@gmail.com"
        },
        "payment": {
            "transaction": "b563feb7b2b84b6test",
            "request_id": "",
            "currency": "USD",
            "provider": "wbpay",
            "amount": 1817,
            "payment_dt": 1637907727,
            "bank": "alpha",
            "delivery_cost": 1500,
            "goods_total": 317,
            "custom_fee": 0
        },
        "items": [
            {
                "chrt_id": 9934930,
                "track_number": "WBILMTESTTRACK",
                "price": 453,
                "rid": "ab4219087a764ae0btest",
                "name": "Mascaras",
                "sale": 30,
                "size": "0",
                "total_price": 317,
                "nm_id": 2389212,
                "brand": "Vivienne Sabo",
                "status": 202
            }
        ],
        "locale": "en",
        "internal_signature": "",
        "customer_id": "test",
        "delivery_service": "meest",
        "shardkey": "9",
        "sm_id": 99,
        "date_created": "2021-11-26T06:22:19Z",
        "oof_shard": "1"
    }"#;

    #[tokio::test]
    async fn test_ingest_persists_valid_payload() {
        let repo = Arc::new(InMemoryOrderRepository::default());
        let service = IngestServiceComponent::new(repo.clone());

        let uid = service.ingest(SAMPLE_PAYLOAD.as_bytes()).await.unwrap();
        assert_eq!(uid, "b563feb7b2b84b6test");

        let stored = repo.stored(&uid).unwrap();
        assert_eq!(stored.payment.amount, 1817);
        assert_eq!(stored.items[0].sale_percent, 30);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_parse_failure() {
        let repo = Arc::new(InMemoryOrderRepository::default());
        let service = IngestServiceComponent::new(repo.clone());

        let err = service.ingest(b"{\"order_uid\": ").await.unwrap_err();
        assert!(matches!(err, OrderlyError::Parse(_)));
        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_order_is_rejected_before_store() {
        let repo = Arc::new(InMemoryOrderRepository::default());
        let service = IngestServiceComponent::new(repo.clone());

        let mut order = sample_order("ORD1", 0);
        order.delivery.email = "not-an-email".to_string();
        let payload = serde_json::to_vec(&order).unwrap();

        let err = service.ingest(&payload).await.unwrap_err();
        assert_eq!(err.field(), Some("order.delivery.email"));
        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_redelivery_overwrites() {
        let repo = Arc::new(InMemoryOrderRepository::default());
        let service = IngestServiceComponent::new(repo.clone());

        let mut order = sample_order("ORD1", 0);
        service.ingest(&serde_json::to_vec(&order).unwrap()).await.unwrap();
        order.track_number = "UPDATED".to_string();
        service.ingest(&serde_json::to_vec(&order).unwrap()).await.unwrap();

        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 2);
        assert_eq!(repo.stored("ORD1").unwrap().track_number, "UPDATED");
    }

    #[tokio::test]
    async fn test_ingested_order_is_cached_after_first_read() {
        let repo = Arc::new(InMemoryOrderRepository::default());
        let ingest = IngestServiceComponent::new(repo.clone());
        let cache = Arc::new(TtlCache::new(Duration::from_secs(600), Duration::ZERO));
        let orders = OrderServiceImpl::new(repo.clone(), cache, Duration::from_secs(300));

        let order = sample_order("ORD1", 0);
        ingest.ingest(&serde_json::to_vec(&order).unwrap()).await.unwrap();
        assert!(orders.cache().is_empty());

        let first = orders.get_order("ORD1").await.unwrap();
        let second = orders.get_order("ORD1").await.unwrap();
        assert_eq!(first, order);
        assert_eq!(second, order);
        assert_eq!(repo.find_by_uid_calls.load(Ordering::SeqCst), 1);
    }
}
