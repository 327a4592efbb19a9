use axum::{routing::get, Router};

pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod suppliers;
pub mod system;
pub mod users;

/// Router for all authenticated (organization-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/orders", orders::router())
        .nest("/inventory", inventory::router())
        .nest("/suppliers", suppliers::router())
        .nest("/users", users::router())
        .merge(catalog::router())
}
