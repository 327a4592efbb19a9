use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use sapitos_auth::{JwtClaims, Role};
use sapitos_core::{Organization, UserId};
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = sapitos_api::app::build_app(jwt_secret.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, sub: UserId, org: &str, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub,
        org: Organization::new(org).unwrap(),
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// Seeded supplier world: one location, one article, one inventory record.
struct Seeded {
    location_id: String,
    inventory_id: String,
}

async fn seed_supplier(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    org: &str,
    stock: i64,
    min_stock: i64,
) -> Seeded {
    let res = client
        .put(format!("{}/users/me", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": "Ana Torres", "email": "ana@sapitos.mx" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/locations", base_url))
        .bearer_auth(token)
        .json(&json!({
            "name": "Almacén Central",
            "kind": "supplier",
            "organization": org,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let location_id = res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .post(format!("{}/articles", base_url))
        .bearer_auth(token)
        .json(&json!({
            "name": "Playera",
            "category": "Ropa",
            "supplier_price_cents": 5000,
            "sale_price_cents": 9900,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let article_id = res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .post(format!("{}/inventory", base_url))
        .bearer_auth(token)
        .json(&json!({
            "article_id": article_id,
            "location_id": location_id,
            "stock_actual": stock,
            "min_stock": min_stock,
            "recommended_stock": 25,
            "avg_daily_demand": 2.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let inventory_id = res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    Seeded {
        location_id,
        inventory_id,
    }
}

async fn create_order(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    org: &str,
    inventory_id: &str,
    quantity: i64,
) -> String {
    let res = client
        .post(format!("{}/orders", base_url))
        .bearer_auth(token)
        .json(&json!({
            "organization": org,
            "total_cents": 99000,
            "lines": [
                { "inventory_id": inventory_id, "quantity": quantity, "unit_price_cents": 9900 }
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn org_context_is_derived_from_token() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let user_id = UserId::new();
    let token = mint_jwt(jwt_secret, user_id, "Proveedora Centro", vec![Role::new("admin")]);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["organization"].as_str().unwrap(), "Proveedora Centro");
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
}

#[tokio::test]
async fn order_lifecycle_approve_then_dispatch() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let org = "Proveedora Centro";
    let token = mint_jwt(jwt_secret, UserId::new(), org, vec![Role::new("supplier")]);
    let client = reqwest::Client::new();

    let seeded = seed_supplier(&client, &srv.base_url, &token, org, 10, 5).await;
    let order_id = create_order(&client, &srv.base_url, &token, org, &seeded.inventory_id, 10).await;

    // The pending queue for the supplier location shows the order with the
    // requester profile.
    let res = client
        .get(format!(
            "{}/suppliers/{}/orders",
            srv.base_url, seeded.location_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let pending: serde_json::Value = res.json().await.unwrap();
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["id"].as_str().unwrap(), order_id);
    assert_eq!(pending[0]["requested_by"].as_str().unwrap(), "Ana Torres");

    // Approve: estimated delivery is seven days out.
    let res = client
        .post(format!("{}/orders/{}/approve", srv.base_url, order_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let receipt: serde_json::Value = res.json().await.unwrap();
    assert_eq!(receipt["status"].as_str().unwrap(), "approved");
    let expected = (Utc::now().date_naive() + ChronoDuration::days(7)).to_string();
    assert_eq!(
        receipt["estimated_delivery_date"].as_str().unwrap(),
        expected
    );

    // Line items view joins article data and live stock.
    let res = client
        .get(format!("{}/orders/{}/items", srv.base_url, order_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let items: serde_json::Value = res.json().await.unwrap();
    assert_eq!(items[0]["name"].as_str().unwrap(), "Playera");
    assert_eq!(items[0]["quantity"].as_i64().unwrap(), 10);
    assert_eq!(items[0]["available_stock"].as_i64().unwrap(), 10);
    assert_eq!(items[0]["subtotal_cents"].as_u64().unwrap(), 99000);

    // Dispatch: same-day delivery is on time, stock goes to zero and the
    // receipt carries the low-stock advisory.
    let res = client
        .post(format!("{}/orders/{}/dispatch", srv.base_url, order_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let receipt: serde_json::Value = res.json().await.unwrap();
    assert_eq!(receipt["status"].as_str().unwrap(), "in_transit");
    assert_eq!(receipt["line_items_dispatched"].as_u64().unwrap(), 1);
    assert!(receipt["outcome"]["on_time"].as_bool().unwrap());
    assert_eq!(receipt["outcome"]["delivery_days"].as_i64().unwrap(), 0);
    let low_stock = receipt["low_stock"].as_array().unwrap();
    assert_eq!(low_stock.len(), 1);
    assert_eq!(low_stock[0]["article_name"].as_str().unwrap(), "Playera");
    assert_eq!(low_stock[0]["reorder_quantity"].as_i64().unwrap(), 25);

    let res = client
        .get(format!("{}/inventory/{}", srv.base_url, seeded.inventory_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let view: serde_json::Value = res.json().await.unwrap();
    assert_eq!(view["record"]["stock_actual"].as_i64().unwrap(), 0);
    assert_eq!(view["record"]["exported_total"].as_i64().unwrap(), 10);

    // Dispatching again hits the state guard.
    let res = client
        .post(format!("{}/orders/{}/dispatch", srv.base_url, order_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"].as_str().unwrap(), "invalid_state");
}

#[tokio::test]
async fn rejecting_an_order_is_terminal() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let org = "Proveedora Centro";
    let token = mint_jwt(jwt_secret, UserId::new(), org, vec![Role::new("supplier")]);
    let client = reqwest::Client::new();

    let seeded = seed_supplier(&client, &srv.base_url, &token, org, 10, 5).await;
    let order_id = create_order(&client, &srv.base_url, &token, org, &seeded.inventory_id, 2).await;

    let res = client
        .post(format!("{}/orders/{}/reject", srv.base_url, order_id))
        .bearer_auth(&token)
        .json(&json!({ "reason": "sin presupuesto" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let receipt: serde_json::Value = res.json().await.unwrap();
    assert_eq!(receipt["status"].as_str().unwrap(), "rejected");
    assert_eq!(receipt["reason"].as_str().unwrap(), "sin presupuesto");

    // No approval after rejection.
    let res = client
        .post(format!("{}/orders/{}/approve", srv.base_url, order_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn dispatch_shortfall_reports_structured_details() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let org = "Proveedora Centro";
    let token = mint_jwt(jwt_secret, UserId::new(), org, vec![Role::new("supplier")]);
    let client = reqwest::Client::new();

    let seeded = seed_supplier(&client, &srv.base_url, &token, org, 10, 5).await;
    let order_id = create_order(&client, &srv.base_url, &token, org, &seeded.inventory_id, 15).await;

    let res = client
        .post(format!("{}/orders/{}/approve", srv.base_url, order_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/orders/{}/dispatch", srv.base_url, order_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"].as_str().unwrap(), "insufficient_stock");
    assert_eq!(body["shortfall"]["article"].as_str().unwrap(), "Playera");
    assert_eq!(body["shortfall"]["available"].as_i64().unwrap(), 10);
    assert_eq!(body["shortfall"]["requested"].as_i64().unwrap(), 15);

    // Nothing moved.
    let res = client
        .get(format!("{}/inventory/{}", srv.base_url, seeded.inventory_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let view: serde_json::Value = res.json().await.unwrap();
    assert_eq!(view["record"]["stock_actual"].as_i64().unwrap(), 10);
}

#[tokio::test]
async fn inventory_patch_below_minimum_answers_with_advisory() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let org = "Proveedora Centro";
    let token = mint_jwt(jwt_secret, UserId::new(), org, vec![Role::new("admin")]);
    let client = reqwest::Client::new();

    let seeded = seed_supplier(&client, &srv.base_url, &token, org, 10, 5).await;

    let res = client
        .patch(format!("{}/inventory/{}", srv.base_url, seeded.inventory_id))
        .bearer_auth(&token)
        .json(&json!({ "stock_actual": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["low_stock"]["stock_actual"].as_i64().unwrap(), 2);
    assert_eq!(body["low_stock"]["reorder_quantity"].as_i64().unwrap(), 23);

    // Empty patch is a validation error.
    let res = client
        .patch(format!("{}/inventory/{}", srv.base_url, seeded.inventory_id))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Unknown record.
    let res = client
        .patch(format!(
            "{}/inventory/{}",
            srv.base_url,
            uuid::Uuid::now_v7()
        ))
        .bearer_auth(&token)
        .json(&json!({ "stock_actual": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inventory_listing_filters_by_location_kind() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let org = "Proveedora Centro";
    let token = mint_jwt(jwt_secret, UserId::new(), org, vec![Role::new("admin")]);
    let client = reqwest::Client::new();

    let seeded = seed_supplier(&client, &srv.base_url, &token, org, 10, 5).await;

    let res = client
        .get(format!("{}/inventory?kind=supplier", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let views: serde_json::Value = res.json().await.unwrap();
    assert_eq!(views.as_array().unwrap().len(), 1);
    assert_eq!(views[0]["article_name"].as_str().unwrap(), "Playera");

    let res = client
        .get(format!("{}/inventory?kind=branch", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let views: serde_json::Value = res.json().await.unwrap();
    assert!(views.as_array().unwrap().is_empty());

    let res = client
        .get(format!(
            "{}/suppliers/{}/inventory",
            srv.base_url, seeded.location_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let views: serde_json::Value = res.json().await.unwrap();
    assert_eq!(views.as_array().unwrap().len(), 1);
}
