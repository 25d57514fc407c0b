//! Admin API endpoints: key management and usage reporting

pub mod api_keys;
pub mod usage;

use axum::{
    routing::get,
    Router,
};

use super::state::AppState;

/// Key management under `/admin`
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api-keys",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route(
            "/api-keys/{key_id}",
            get(api_keys::get_api_key).delete(api_keys::deactivate_api_key),
        )
}

/// Usage reporting, merged at the root
pub fn create_usage_router() -> Router<AppState> {
    Router::new()
        .route("/usage", get(usage::overall_usage))
        .route("/usage/keys", get(usage::keys_usage))
        .route("/usage/keys/{key_id}", get(usage::key_usage))
}
