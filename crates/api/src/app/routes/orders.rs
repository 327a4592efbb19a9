use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use sapitos_core::{InventoryId, OrderId, Organization};
use sapitos_orders::{Order, OrderLine};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order))
        .route("/:id/items", get(order_line_items))
        .route("/:id/approve", post(approve_order))
        .route("/:id/reject", post(reject_order))
        .route("/:id/dispatch", post(dispatch_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let organization = match Organization::new(body.organization) {
        Ok(o) => o,
        Err(e) => return errors::store_error_to_response(e.into()),
    };

    let mut lines = Vec::with_capacity(body.lines.len());
    for l in body.lines {
        let inventory_id: InventoryId = match dto::parse_id(&l.inventory_id, "inventory_id") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        match OrderLine::new(inventory_id, l.quantity, l.unit_price_cents) {
            Ok(line) => lines.push(line),
            Err(e) => return errors::store_error_to_response(e.into()),
        }
    }

    let order = Order::create(
        OrderId::new(),
        Utc::now(),
        principal.user_id(),
        organization,
        body.order_type.unwrap_or_else(|| "supplier".to_string()),
        body.total_cents,
        body.discount_cents.unwrap_or(0),
    );
    let order_id = order.id;

    match services.store.create_order(order, lines).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": order_id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn order_line_items(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match dto::parse_id(&id, "order id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.order_line_items(order_id).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn approve_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match dto::parse_id(&id, "order id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .store
        .approve_order(order_id, Utc::now().date_naive())
        .await
    {
        Ok(receipt) => Json(receipt).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn reject_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RejectOrderRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match dto::parse_id(&id, "order id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .store
        .reject_order(order_id, Utc::now().date_naive(), body.reason)
        .await
    {
        Ok(receipt) => Json(receipt).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn dispatch_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match dto::parse_id(&id, "order id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .store
        .dispatch_order(order_id, Utc::now().date_naive())
        .await
    {
        Ok(receipt) => {
            // Post-commit: the dispatch already stands, notifications are
            // best-effort on top of it.
            services.emit_low_stock(&receipt.low_stock);
            Json(receipt).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
