//! Key-authenticated v1 endpoints
//!
//! Every route here sits behind the usage gate.

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use serde::Serialize;

use crate::api::gate::{api_key_gate, GatedKey, UsageGate};
use crate::api::types::Json;
use crate::domain::api_key::ApiKeyId;

use super::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct VerifyKeyResponse {
    pub valid: bool,
    pub key_id: ApiKeyId,
}

/// GET /v1/keys/verify
///
/// Lets a client confirm its key works; reaching the handler means it does.
pub async fn verify_key(GatedKey(key_id): GatedKey) -> Json<VerifyKeyResponse> {
    Json(VerifyKeyResponse {
        valid: true,
        key_id,
    })
}

/// Create the gated v1 router, merged at the root
pub fn create_v1_router(gate: Arc<UsageGate>) -> Router<AppState> {
    Router::new()
        .route("/v1/keys/verify", get(verify_key))
        .route_layer(from_fn_with_state(gate, api_key_gate))
}
