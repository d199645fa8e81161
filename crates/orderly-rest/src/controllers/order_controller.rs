//! Order lookup controller.

use crate::{
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use orderly_core::Order;
use tracing::debug;

/// Creates the order router.
pub fn router() -> Router<AppState> {
    Router::new().route("/:order_uid", get(get_order))
}

/// Get an order by its uid.
///
/// Served from the cache when present, otherwise loaded from the store and
/// cached.
#[utoipa::path(
    get,
    path = "/orders/{order_uid}",
    tag = "orders",
    params(
        ("order_uid" = String, Path, description = "Order uid")
    ),
    responses(
        (status = 200, description = "Order found, wrapped in the standard envelope", body = Order),
        (status = 404, description = "Order not found", body = orderly_core::ErrorResponse),
        (status = 503, description = "Store unavailable", body = orderly_core::ErrorResponse)
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
) -> ApiResult<Order> {
    debug!(order_uid = %order_uid, "Get order request");

    let order = state.order_service.get_order(&order_uid).await?;
    ok(order)
}
