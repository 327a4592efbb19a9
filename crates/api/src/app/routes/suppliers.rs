use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use sapitos_core::LocationId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:location_id/orders", get(pending_orders))
        .route("/:location_id/inventory", get(location_inventory))
}

/// Pending orders addressed to the organization owning this supplier
/// location, newest first.
pub async fn pending_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Path(location_id): Path<String>,
) -> axum::response::Response {
    let location_id: LocationId = match dto::parse_id(&location_id, "location id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.pending_orders_for_supplier(location_id).await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn location_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(location_id): Path<String>,
) -> axum::response::Response {
    let location_id: LocationId = match dto::parse_id(&location_id, "location id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.inventory_for_location(location_id).await {
        Ok(views) => Json(views).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
