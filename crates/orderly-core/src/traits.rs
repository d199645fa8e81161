//! Core traits shared across layers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a single dependency probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthStatus {
    /// Component name, e.g. `database`.
    pub component: String,
    pub healthy: bool,
    /// Failure detail when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn up(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            healthy: true,
            detail: None,
        }
    }

    #[must_use]
    pub fn down(component: impl Into<String>, detail: impl ToString) -> Self {
        Self {
            component: component.into(),
            healthy: false,
            detail: Some(detail.to_string()),
        }
    }
}

/// Readiness probe for an external dependency.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Probes the dependency. Implementations never fail; an unreachable
    /// dependency is reported through [`HealthStatus::down`].
    async fn check(&self) -> HealthStatus;
}
