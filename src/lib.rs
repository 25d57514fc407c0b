//! keygate
//!
//! API key issuance and verification with a usage-metered gate:
//! - Keys are `prefix.secret`; only the prefix and a SHA-256 hash are stored
//! - Every gated request attributable to a key leaves one usage record
//! - Admin reporting over the usage ledger

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use api::state::AppState;
use config::DEFAULT_JWT_SECRET;
use infrastructure::auth::{JwtConfig, JwtService};
use infrastructure::storage::{StorageConfig, StorageHandle};
use tracing::{info, warn};

/// Create the application state with default configuration (in-memory storage)
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = StorageConfig::from_settings(&config.storage)?;
    info!("Storage backend: {:?}", storage_config.storage_type());

    let storage = StorageHandle::connect(&storage_config).await?;
    let jwt = create_jwt_service(config);

    Ok(AppState::new(storage, jwt).with_default_window_days(config.usage.default_window_days))
}

/// Build the admin token service from the `auth` config section
pub fn create_jwt_service(config: &AppConfig) -> JwtService {
    if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("auth.jwt_secret is the built-in default. Set APP__AUTH__JWT_SECRET in production.");
    }

    JwtService::new(JwtConfig::new(
        config.auth.jwt_secret.clone(),
        config.auth.token_expiration_hours,
    ))
}
