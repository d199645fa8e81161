//! # Orderly REST
//!
//! Read-only HTTP API over the order cache, plus health, readiness,
//! metrics and OpenAPI endpoints.

pub mod controllers;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
