//! Application state for Axum handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use orderly_core::HealthCheck;
use orderly_service::OrderService;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub order_service: Arc<dyn OrderService>,
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates a new application state with no readiness probes.
    pub fn new(order_service: Arc<dyn OrderService>) -> Self {
        Self {
            order_service,
            health_checks: Vec::new(),
            metrics: None,
        }
    }

    /// Adds a readiness probe consulted by `GET /ready`.
    #[must_use]
    pub fn with_health_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.health_checks.push(check);
        self
    }

    /// Enables `GET /metrics` backed by `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
