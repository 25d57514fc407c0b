//! Admin authentication extractor
//!
//! Admin routes take `Authorization: Bearer <jwt>` signed with the configured
//! secret and carrying the admin role.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::debug;

use crate::api::types::ApiError;
use crate::infrastructure::auth::{JwtClaims, JwtService};

/// Extractor that requires a valid admin token
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub JwtClaims);

impl RequireAdmin {
    /// Subject of the admin token
    pub fn subject(&self) -> &str {
        &self.0.sub
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    Arc<JwtService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            ApiError::unauthorized("Admin access required. Provide 'Authorization: Bearer <token>'")
        })?;

        let jwt = Arc::<JwtService>::from_ref(state);
        let claims = jwt.validate(token).map_err(|e| {
            debug!(error = %e, "Rejected admin token");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        if !claims.is_admin() {
            debug!(subject = %claims.sub, role = %claims.role, "Token lacks admin role");
            return Err(ApiError::forbidden("Admin access required"));
        }

        debug!(subject = %claims.sub, "Admin access via JWT");
        Ok(RequireAdmin(claims))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
