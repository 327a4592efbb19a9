use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use sapitos_catalog::{Article, Location, LocationKind};
use sapitos_core::{ArticleId, LocationId, Organization};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route("/locations", get(list_locations).post(create_location))
}

pub async fn list_articles(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.list_articles().await {
        Ok(articles) => Json(articles).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_article(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateArticleRequest>,
) -> axum::response::Response {
    let article = match Article::new(
        ArticleId::new(),
        body.name,
        body.category,
        body.supplier_price_cents,
        body.sale_price_cents,
        body.season,
    ) {
        Ok(a) => a,
        Err(e) => return errors::store_error_to_response(e.into()),
    };
    let id = article.id;

    match services.store.create_article(article).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_locations(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.list_locations().await {
        Ok(locations) => Json(locations).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_location(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateLocationRequest>,
) -> axum::response::Response {
    let kind = match LocationKind::parse(&body.kind) {
        Ok(k) => k,
        Err(e) => return errors::store_error_to_response(e.into()),
    };
    let organization = match Organization::new(body.organization) {
        Ok(o) => o,
        Err(e) => return errors::store_error_to_response(e.into()),
    };

    let location = match Location::new(
        LocationId::new(),
        body.name,
        kind,
        organization,
        body.position_x.unwrap_or(0.0),
        body.position_y.unwrap_or(0.0),
        Utc::now(),
    ) {
        Ok(l) => l,
        Err(e) => return errors::store_error_to_response(e.into()),
    };
    let id = location.id;

    match services.store.create_location(location).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
