//! Public key request endpoint

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::state::AppState;
use super::types::{ApiError, Json, ValidatedJson};

/// Self-service key request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct KeyRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Kept in the request log only; not stored with the key
    #[validate(length(min = 1, message = "Purpose is required"))]
    pub purpose: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyRequestResponse {
    pub name: String,
    pub key: String,
}

/// POST /keys/request
pub async fn request_key(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<KeyRequest>,
) -> Result<(StatusCode, Json<KeyRequestResponse>), ApiError> {
    let issued = state.api_key_service.issue(&request.name, None).await?;

    info!(
        key_id = %issued.id,
        name = %issued.name,
        purpose = %request.purpose,
        "API key requested"
    );

    Ok((
        StatusCode::CREATED,
        Json(KeyRequestResponse {
            name: issued.name,
            key: issued.key,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_request_validation() {
        let ok = KeyRequest {
            name: "ci-runner".to_string(),
            purpose: "nightly builds".to_string(),
        };
        assert!(ok.validate().is_ok());

        let no_purpose = KeyRequest {
            name: "ci-runner".to_string(),
            purpose: String::new(),
        };
        assert!(no_purpose.validate().is_err());
    }
}
