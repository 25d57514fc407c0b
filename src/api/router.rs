//! HTTP router assembly

use axum::{middleware, routing::get, routing::post, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

use super::admin;
use super::health;
use super::keys;
use super::middleware::{
    logging_middleware, metrics_middleware, request_span, request_validation_middleware,
    security_headers_middleware,
};
use super::state::AppState;
use super::v1;

/// Create the full router with application state
pub fn create_router(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let gate = state.gate.clone();

    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Public self-service issuance
        .route("/keys/request", post(keys::request_key))
        // Key-authenticated API
        .merge(v1::create_v1_router(gate))
        // Admin API
        .nest("/admin", admin::create_admin_router())
        .merge(admin::create_usage_router())
        .with_state(state)
        // Outside the gate so a panicking handler still becomes a 500
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_validation_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m));
    }

    router
}
