use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::put, Json, Router};

use sapitos_infra::UserProfile;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/me", put(register_profile))
}

/// Upsert the authenticated user's display profile. The identity itself
/// comes from the token; this only maintains the name/email shown on
/// pending-order listings.
pub async fn register_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::RegisterUserRequest>,
) -> axum::response::Response {
    let profile = UserProfile {
        id: principal.user_id(),
        name: body.name,
        email: body.email,
    };
    let id = profile.id;

    match services.store.upsert_user(profile).await {
        Ok(()) => Json(serde_json::json!({ "id": id.to_string() })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
