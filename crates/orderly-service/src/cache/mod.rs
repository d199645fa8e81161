//! In-memory caching for the service layer.
//!
//! [`TtlCache`] is a generic string-keyed store with per-entry expiry,
//! checked lazily on read and enforced actively by a background sweeper.

mod ttl_cache;

pub use ttl_cache::{CacheEntry, TtlCache};

use std::time::Duration;

/// Default TTL for order entries (10 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Default TTL for entries seeded by the warm-up (5 minutes).
pub const WARMUP_TTL: Duration = Duration::from_secs(300);
