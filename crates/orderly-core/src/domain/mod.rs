//! # Order Aggregate
//!
//! The single entity this service stores and serves: a root order record
//! owning exactly one delivery, exactly one payment, and an ordered list of
//! line items. Field-level consistency is not enforced by the types; see
//! [`crate::validation::validate_order`].

mod delivery;
mod item;
mod order;
mod payment;

pub use delivery::Delivery;
pub use item::Item;
pub use order::{Order, OrderHeader};
pub use payment::Payment;
