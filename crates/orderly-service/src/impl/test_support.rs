//! In-memory repository shared by the service tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use orderly_core::{Delivery, Item, Order, OrderHeader, OrderlyError, OrderlyResult, Payment};
use orderly_repository::OrderRepository;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<String, Order>>,
    failing_payment: Mutex<Option<String>>,
    pub exists_calls: AtomicUsize,
    pub find_by_uid_calls: AtomicUsize,
    pub sub_record_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
}

impl InMemoryOrderRepository {
    pub fn with_orders(orders: Vec<Order>) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.orders.lock();
            for order in orders {
                map.insert(order.uid.clone(), order);
            }
        }
        repo
    }

    pub fn fail_payment_for(&self, uid: &str) {
        *self.failing_payment.lock() = Some(uid.to_string());
    }

    pub fn stored(&self, uid: &str) -> Option<Order> {
        self.orders.lock().get(uid).cloned()
    }

    fn get(&self, uid: &str) -> OrderlyResult<Order> {
        self.stored(uid)
            .ok_or_else(|| OrderlyError::not_found("Order", uid))
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn exists(&self, order_uid: &str) -> OrderlyResult<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.orders.lock().contains_key(order_uid))
    }

    async fn find_by_uid(&self, order_uid: &str) -> OrderlyResult<Order> {
        self.find_by_uid_calls.fetch_add(1, Ordering::SeqCst);
        self.get(order_uid)
    }

    async fn find_recent(&self, limit: u32) -> OrderlyResult<Vec<OrderHeader>> {
        let mut headers: Vec<OrderHeader> =
            self.orders.lock().values().map(Order::header).collect();
        headers.sort_by(|a, b| {
            b.date_created
                .cmp(&a.date_created)
                .then_with(|| a.uid.cmp(&b.uid))
        });
        headers.truncate(limit as usize);
        Ok(headers)
    }

    async fn find_delivery(&self, order_uid: &str) -> OrderlyResult<Delivery> {
        self.sub_record_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(order_uid)?.delivery)
    }

    async fn find_payment(&self, order_uid: &str) -> OrderlyResult<Payment> {
        self.sub_record_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_payment.lock().as_deref() == Some(order_uid) {
            return Err(OrderlyError::StoreUnavailable("connection reset".into()));
        }
        Ok(self.get(order_uid)?.payment)
    }

    async fn find_items(&self, order_uid: &str) -> OrderlyResult<Vec<Item>> {
        self.sub_record_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(order_uid)?.items)
    }

    async fn save(&self, order: &Order) -> OrderlyResult<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.orders.lock().insert(order.uid.clone(), order.clone());
        Ok(())
    }
}

/// A consistent order with one item, created `created_secs` after the epoch.
pub fn sample_order(uid: &str, created_secs: i64) -> Order {
    Order {
        uid: uid.to_string(),
        track_number: "WBILMTESTTRACK".to_string(),
        entry: "WBIL".to_string(),
        delivery: Delivery {
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        },
        payment: Payment {
            transaction_id: uid.to_string(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1500,
            payment_timestamp: 1_637_907_727,
            bank: "alpha".to_string(),
            delivery_cost: 500,
            goods_total: 1000,
            ..Payment::default()
        },
        items: vec![Item {
            chart_id: 9_934_930,
            track_number: "WBILMTESTTRACK".to_string(),
            price: 1000,
            rid: "ab4219087a764ae0btest".to_string(),
            name: "Mascaras".to_string(),
            size: "0".to_string(),
            total_price: 1000,
            nomenclature_id: 2_389_212,
            brand: "Vivienne Sabo".to_string(),
            status: 202,
            ..Item::default()
        }],
        locale: "en".to_string(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shard_key: "9".to_string(),
        stock_management_id: 99,
        date_created: Utc.timestamp_opt(created_secs, 0).single().expect("valid timestamp"),
        out_of_failure_shard: "1".to_string(),
        ..Order::default()
    }
}
