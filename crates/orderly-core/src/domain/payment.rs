//! Payment sub-record.

use serde::{Deserialize, Serialize};

/// Payment details of an order.
///
/// Monetary amounts are in minor currency units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Payment {
    #[serde(rename = "transaction")]
    pub transaction_id: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: u32,
    /// Unix timestamp, seconds.
    #[serde(rename = "payment_dt")]
    pub payment_timestamp: i64,
    pub bank: String,
    pub delivery_cost: u32,
    pub goods_total: u32,
    pub custom_fee: u32,
}
