//! Order root record.

use super::{Delivery, Item, Payment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The full order aggregate as it travels on the wire and sits in the cache.
///
/// Absent JSON fields decode to their zero values; semantic checks happen
/// in the validation gate, not during decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct Order {
    /// Unique order key.
    #[serde(rename = "order_uid")]
    pub uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<Item>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    #[serde(rename = "shardkey")]
    pub shard_key: String,
    #[serde(rename = "sm_id")]
    pub stock_management_id: i32,
    pub date_created: DateTime<Utc>,
    #[serde(rename = "oof_shard")]
    pub out_of_failure_shard: String,
}

/// Root-only projection of an order, without its owned sub-records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderHeader {
    pub uid: String,
    pub track_number: String,
    pub entry: String,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shard_key: String,
    pub stock_management_id: i32,
    pub date_created: DateTime<Utc>,
    pub out_of_failure_shard: String,
}

impl Order {
    /// Assembles a full aggregate from a root record and its sub-records.
    #[must_use]
    pub fn from_parts(header: OrderHeader, delivery: Delivery, payment: Payment, items: Vec<Item>) -> Self {
        Self {
            uid: header.uid,
            track_number: header.track_number,
            entry: header.entry,
            delivery,
            payment,
            items,
            locale: header.locale,
            internal_signature: header.internal_signature,
            customer_id: header.customer_id,
            delivery_service: header.delivery_service,
            shard_key: header.shard_key,
            stock_management_id: header.stock_management_id,
            date_created: header.date_created,
            out_of_failure_shard: header.out_of_failure_shard,
        }
    }

    /// Returns the root-only projection of this order.
    #[must_use]
    pub fn header(&self) -> OrderHeader {
        OrderHeader {
            uid: self.uid.clone(),
            track_number: self.track_number.clone(),
            entry: self.entry.clone(),
            locale: self.locale.clone(),
            internal_signature: self.internal_signature.clone(),
            customer_id: self.customer_id.clone(),
            delivery_service: self.delivery_service.clone(),
            shard_key: self.shard_key.clone(),
            stock_management_id: self.stock_management_id,
            date_created: self.date_created,
            out_of_failure_shard: self.out_of_failure_shard.clone(),
        }
    }

    /// Sum of all item totals.
    #[must_use]
    pub fn items_total(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.total_price)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
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
        "items": [{
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
        }],
        "locale": "en",
        "internal_signature": "",
        "customer_id": "test",
        "delivery_service": "meest",
        "shardkey": "9",
        "sm_id": 99,
        "date_created": "2021-11-26T06:22:19Z",
        "oof_shard": "1"
    }"#;

    #[test]
    fn test_decode_wire_format() {
        let order: Order = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(order.uid, "b563feb7b2b84b6test");
        assert_eq!(order.shard_key, "9");
        assert_eq!(order.stock_management_id, 99);
        assert_eq!(order.payment.transaction_id, "b563feb7b2b84b6test");
        assert_eq!(order.payment.payment_timestamp, 1_637_907_727);
        assert_eq!(order.items[0].chart_id, 9_934_930);
        assert_eq!(order.items[0].sale_percent, 30);
        assert_eq!(order.items[0].nomenclature_id, 2_389_212);
        assert_eq!(order.date_created.to_rfc3339(), "2021-11-26T06:22:19+00:00");
    }

    #[test]
    fn test_missing_fields_decode_to_defaults() {
        let order: Order = serde_json::from_str(r#"{"order_uid": "ORD1"}"#).unwrap();
        assert_eq!(order.uid, "ORD1");
        assert!(order.items.is_empty());
        assert_eq!(order.payment.amount, 0);
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let result = serde_json::from_str::<Order>(r#"{"order_uid": 42}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_header_and_parts_reassemble() {
        let order: Order = serde_json::from_str(SAMPLE).unwrap();
        let rebuilt = Order::from_parts(
            order.header(),
            order.delivery.clone(),
            order.payment.clone(),
            order.items.clone(),
        );
        assert_eq!(rebuilt, order);
    }

    #[test]
    fn test_items_total() {
        let order: Order = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(order.items_total(), 317);
    }
}
