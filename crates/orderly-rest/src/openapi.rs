//! OpenAPI documentation configuration.

use crate::controllers::health_controller::{HealthResponse, ReadinessResponse};
use orderly_core::{Delivery, ErrorResponse, FieldError, HealthStatus, Item, Order, Payment};
use utoipa::OpenApi;

/// OpenAPI documentation for the Orderly API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Orderly API",
        version = "1.0.0",
        description = "Read API for cached orders",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        crate::controllers::order_controller::get_order,
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(
            Order,
            Delivery,
            Payment,
            Item,
            ErrorResponse,
            FieldError,
            HealthStatus,
            HealthResponse,
            ReadinessResponse,
        )
    ),
    tags(
        (name = "orders", description = "Order lookup"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_order_path_and_schemas() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/orders/{order_uid}"));
        assert!(doc.paths.paths.contains_key("/ready"));

        let schemas = doc.components.unwrap().schemas;
        assert!(schemas.contains_key("Order"));
        assert!(schemas.contains_key("ErrorResponse"));
    }
}
