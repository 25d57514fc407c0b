//! Usage reporting admin endpoints

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query};
use crate::domain::api_key::ApiKeyId;
use crate::domain::usage::UsageStats;
use crate::infrastructure::usage::MAX_WINDOW_DAYS;

use super::api_keys::parse_key_id;

/// Trailing window in whole days; the configured default applies when absent
#[derive(Debug, Default, Deserialize)]
pub struct UsageWindowParams {
    pub days: Option<u32>,
}

impl UsageWindowParams {
    fn resolve(&self, default_days: u32) -> Result<u32, ApiError> {
        match self.days {
            Some(days) if days == 0 || days > MAX_WINDOW_DAYS => Err(ApiError::bad_request(
                format!("days must be between 1 and {}", MAX_WINDOW_DAYS),
            )),
            Some(days) => Ok(days),
            None => Ok(default_days),
        }
    }
}

/// Per-key request count joined with key details
#[derive(Debug, Clone, Serialize)]
pub struct KeyUsageResponse {
    pub id: ApiKeyId,
    pub name: String,
    pub prefix: String,
    pub active: bool,
    pub requests: u64,
}

/// GET /usage
///
/// Responds with `null` when the window holds no records.
pub async fn overall_usage(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<UsageWindowParams>,
) -> Result<Json<Option<UsageStats>>, ApiError> {
    let days = params.resolve(state.default_window_days)?;

    Ok(Json(state.ledger.overall_stats(days).await?))
}

/// GET /usage/keys
pub async fn keys_usage(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<UsageWindowParams>,
) -> Result<Json<Vec<KeyUsageResponse>>, ApiError> {
    let days = params.resolve(state.default_window_days)?;

    let keys = state.api_key_service.list(true).await?;
    let counts = state.ledger.all_keys_usage(days).await?;

    let usage = keys
        .into_iter()
        .map(|key| KeyUsageResponse {
            requests: counts.get(&key.id).copied().unwrap_or(0),
            id: key.id,
            name: key.name,
            prefix: key.prefix,
            active: key.active,
        })
        .collect();

    Ok(Json(usage))
}

/// GET /usage/keys/{key_id}
pub async fn key_usage(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(key_id): Path<String>,
    Query(params): Query<UsageWindowParams>,
) -> Result<Json<UsageStats>, ApiError> {
    let key_id = parse_key_id(&key_id)?;
    let days = params.resolve(state.default_window_days)?;

    state
        .ledger
        .stats_for_key(&key_id, days)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No usage data found for this API key"))
}
