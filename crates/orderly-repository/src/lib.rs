//! # Orderly Repository
//!
//! Durable store adapter for the order aggregate.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn OrderRepository>   (domain interface)
//! PgOrderRepository               (SQLx / Postgres)
//!   ↓  Arc<dyn DatabasePoolInterface>
//! Postgres
//! ```
//!
//! Every multi-row write for one order happens inside a single transaction
//! scoped to that call.

pub mod pool;
pub mod postgres;
pub mod traits;

pub use pool::*;
pub use postgres::*;
pub use traits::*;
