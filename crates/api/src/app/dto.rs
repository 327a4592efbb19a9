use axum::http::StatusCode;
use serde::Deserialize;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub inventory_id: String,
    pub quantity: i64,
    pub unit_price_cents: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Target organization (the supplier fulfilling this order).
    pub organization: String,
    pub order_type: Option<String>,
    pub total_cents: u64,
    pub discount_cents: Option<u64>,
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct RejectOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInventoryRequest {
    pub article_id: String,
    pub location_id: String,
    pub stock_actual: i64,
    pub min_stock: i64,
    pub recommended_stock: i64,
    pub safety_stock: Option<i64>,
    pub profit_margin_bp: Option<i64>,
    pub restock_lead_days: Option<i64>,
    pub avg_daily_demand: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub name: String,
    pub category: String,
    pub supplier_price_cents: u64,
    pub sale_price_cents: u64,
    pub season: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub kind: String,
    pub organization: String,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
}

// -------------------------
// Mapping helpers
// -------------------------

/// Parse a path/body identifier, answering 400 `invalid_id` on failure.
pub fn parse_id<T: std::str::FromStr>(
    value: &str,
    field: &'static str,
) -> Result<T, axum::response::Response> {
    value.parse::<T>().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid {field}"),
        )
    })
}
