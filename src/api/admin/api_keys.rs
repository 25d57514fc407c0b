//! API key management admin endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query, ValidatedJson};
use crate::domain::api_key::{ApiKeyId, ApiKeySummary, IssuedApiKey};

/// Request to create a new API key
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateApiKeyRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListApiKeysParams {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Newly created key; the only response that carries the raw credential
#[derive(Debug, Clone, Serialize)]
pub struct CreatedApiKeyResponse {
    pub id: ApiKeyId,
    pub name: String,
    pub key: String,
}

impl From<IssuedApiKey> for CreatedApiKeyResponse {
    fn from(issued: IssuedApiKey) -> Self {
        Self {
            id: issued.id,
            name: issued.name,
            key: issued.key,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Parse a key id from a path segment
pub(crate) fn parse_key_id(raw: &str) -> Result<ApiKeyId, ApiError> {
    raw.parse::<ApiKeyId>()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

/// GET /admin/api-keys
pub async fn list_api_keys(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListApiKeysParams>,
) -> Result<Json<Vec<ApiKeySummary>>, ApiError> {
    let keys = state.api_key_service.list(params.include_inactive).await?;

    Ok(Json(keys))
}

/// POST /admin/api-keys
pub async fn create_api_key(
    admin: RequireAdmin,
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<CreatedApiKeyResponse>), ApiError> {
    let issued = state
        .api_key_service
        .issue(&request.name, request.user_id.as_deref())
        .await?;

    info!(key_id = %issued.id, admin = %admin.subject(), "API key created by admin");

    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// GET /admin/api-keys/{key_id}
pub async fn get_api_key(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(key_id): Path<String>,
) -> Result<Json<ApiKeySummary>, ApiError> {
    let key_id = parse_key_id(&key_id)?;

    state
        .api_key_service
        .get(&key_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("API key '{}' not found", key_id)))
}

/// DELETE /admin/api-keys/{key_id}
///
/// Deactivates rather than deletes so usage history keeps its attribution.
pub async fn deactivate_api_key(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(key_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let key_id = parse_key_id(&key_id)?;

    if !state.api_key_service.deactivate(&key_id).await? {
        return Err(ApiError::not_found(format!("API key '{}' not found", key_id)));
    }

    info!(key_id = %key_id, admin = %admin.subject(), "API key deactivated by admin");

    Ok(Json(MessageResponse {
        message: "API key deactivated successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::MAX_API_KEY_NAME_LENGTH;

    #[test]
    fn test_create_request_validation() {
        let valid = CreateApiKeyRequest {
            name: "ci".to_string(),
            user_id: None,
        };
        assert!(valid.validate().is_ok());

        let empty = CreateApiKeyRequest {
            name: String::new(),
            user_id: None,
        };
        assert!(empty.validate().is_err());

        let long = CreateApiKeyRequest {
            name: "x".repeat(MAX_API_KEY_NAME_LENGTH + 1),
            user_id: None,
        };
        assert!(long.validate().is_err());

        let blank_owner = CreateApiKeyRequest {
            name: "ci".to_string(),
            user_id: Some(String::new()),
        };
        assert!(blank_owner.validate().is_err());
    }

    #[test]
    fn test_parse_key_id() {
        assert!(parse_key_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert_eq!(
            parse_key_id("nope").unwrap_err().status,
            StatusCode::BAD_REQUEST
        );
    }
}
