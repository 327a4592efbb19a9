use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use sapitos_catalog::LocationKind;
use sapitos_core::{ArticleId, InventoryId, LocationId};
use sapitos_inventory::{InventoryPatch, InventoryRecord};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_inventory).post(create_inventory))
        .route(
            "/:id",
            get(get_inventory)
                .patch(patch_inventory)
                .delete(delete_inventory),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional location-kind filter: office, branch, or supplier.
    pub kind: Option<String>,
}

pub async fn list_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    let kind = match query.kind.as_deref().map(LocationKind::parse).transpose() {
        Ok(k) => k,
        Err(e) => return errors::store_error_to_response(e.into()),
    };

    match services.store.list_inventory(kind).await {
        Ok(views) => Json(views).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InventoryId = match dto::parse_id(&id, "inventory id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_inventory(id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateInventoryRequest>,
) -> axum::response::Response {
    let article_id: ArticleId = match dto::parse_id(&body.article_id, "article_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let location_id: LocationId = match dto::parse_id(&body.location_id, "location_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut record = match InventoryRecord::new(
        InventoryId::new(),
        article_id,
        location_id,
        body.stock_actual,
        body.min_stock,
        body.recommended_stock,
        body.safety_stock.unwrap_or(0),
    ) {
        Ok(r) => r,
        Err(e) => return errors::store_error_to_response(e.into()),
    };
    record.profit_margin_bp = body.profit_margin_bp.unwrap_or(0);
    record.restock_lead_days = body.restock_lead_days.unwrap_or(0);
    record.avg_daily_demand = body.avg_daily_demand.unwrap_or(0.0);

    match services.store.create_inventory(record).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn patch_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<InventoryPatch>,
) -> axum::response::Response {
    let id: InventoryId = match dto::parse_id(&id, "inventory id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.patch_inventory(id, patch).await {
        Ok(advisory) => {
            if let Some(ref advisory) = advisory {
                services.emit_low_stock(std::slice::from_ref(advisory));
            }
            Json(serde_json::json!({ "low_stock": advisory })).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InventoryId = match dto::parse_id(&id, "inventory id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.delete_inventory(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
