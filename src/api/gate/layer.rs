//! Axum integration for the usage gate

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::types::ApiError;
use crate::domain::api_key::ApiKeyId;

use super::credential::{extract_credential, RequestMetadata};
use super::usage_gate::{GateError, GateRejection, UsageGate};

/// Key admitted by the gate, available to gated handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatedKey(pub ApiKeyId);

impl<S> FromRequestParts<S> for GatedKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<GatedKey>()
            .copied()
            .ok_or_else(|| ApiError::internal("Route is not behind the API key gate"))
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        ApiError::unauthorized(self.to_string()).into_response()
    }
}

/// Middleware that meters every request through the [`UsageGate`]
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn api_key_gate(
    State(gate): State<Arc<UsageGate>>,
    request: Request,
    next: Next,
) -> Response {
    let credential = extract_credential(&request);
    let metadata = RequestMetadata::from_request(&request);

    let result = gate
        .guard(credential, metadata, |key_id| async move {
            let mut request = request;
            request.extensions_mut().insert(GatedKey(key_id));
            Ok::<_, Infallible>(next.run(request).await)
        })
        .await;

    match result {
        Ok(response) => response,
        Err(GateError::Rejected(rejection)) => rejection.into_response(),
        Err(GateError::Handler(never)) => match never {},
    }
}
