//! # Orderly Core
//!
//! Core types, traits, and error definitions for Orderly.
//! This crate holds the order aggregate, the validation gate that guards
//! ingestion, and the lifecycle primitives shared by every other layer.

pub mod domain;
pub mod error;
pub mod result;
pub mod shutdown;
pub mod telemetry;
pub mod traits;
pub mod validation;

pub use domain::*;
pub use error::*;
pub use result::*;
pub use shutdown::*;
pub use telemetry::*;
pub use traits::*;
pub use validation::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
