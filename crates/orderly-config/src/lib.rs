//! # Orderly Config
//!
//! Configuration management for Orderly.
//! Supports layered configuration from files and environment variables,
//! validated once at load time.

mod app_config;
mod deployment;
mod loader;
mod validation;

pub use app_config::*;
pub use deployment::*;
pub use loader::*;
pub use validation::*;
