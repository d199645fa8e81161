//! # Orderly Server Library
//!
//! Process wiring for Orderly: the dependency injection module, the
//! start-up sequence and graceful shutdown.

pub mod app;
pub mod di;
pub mod startup;

pub use app::Application;
