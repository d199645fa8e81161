//! Line item sub-record.

use serde::{Deserialize, Serialize};

/// A single line item of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Item {
    #[serde(rename = "chrt_id")]
    pub chart_id: i64,
    pub track_number: String,
    pub price: u32,
    pub rid: String,
    pub name: String,
    /// Discount percentage applied to `price`.
    #[serde(rename = "sale")]
    pub sale_percent: i8,
    pub size: String,
    pub total_price: u32,
    #[serde(rename = "nm_id")]
    pub nomenclature_id: i64,
    pub brand: String,
    pub status: i32,
}

impl Item {
    /// Returns `price` with `sale_percent` applied, truncated toward zero.
    #[must_use]
    pub fn discounted_price(&self) -> i64 {
        i64::from(self.price) * (100 - i64::from(self.sale_percent)) / 100
    }
}
