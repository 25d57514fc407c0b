//! Application state for shared services

use std::sync::Arc;

use axum::extract::FromRef;

use crate::infrastructure::api_key::{ApiKeyService, KeyVerifier};
use crate::infrastructure::auth::JwtService;
use crate::infrastructure::storage::StorageHandle;
use crate::infrastructure::usage::{UsageLedger, UsageLedgerTrait, DEFAULT_WINDOW_DAYS};

use super::gate::UsageGate;

/// Application state shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub api_key_service: Arc<ApiKeyService>,
    pub ledger: Arc<dyn UsageLedgerTrait>,
    pub gate: Arc<UsageGate>,
    pub jwt: Arc<JwtService>,
    pub storage: StorageHandle,
    /// Window used when a usage request omits `days`
    pub default_window_days: u32,
}

impl AppState {
    /// Wire services over an open storage handle
    pub fn new(storage: StorageHandle, jwt: JwtService) -> Self {
        let api_keys = storage.api_key_repository();
        let ledger: Arc<dyn UsageLedgerTrait> =
            Arc::new(UsageLedger::new(storage.usage_repository()));
        let verifier = Arc::new(KeyVerifier::new(api_keys.clone()));

        Self {
            api_key_service: Arc::new(ApiKeyService::new(api_keys)),
            gate: Arc::new(UsageGate::new(verifier, ledger.clone())),
            ledger,
            jwt: Arc::new(jwt),
            storage,
            default_window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    pub fn with_default_window_days(mut self, days: u32) -> Self {
        self.default_window_days = days;
        self
    }
}

impl FromRef<AppState> for Arc<JwtService> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::infrastructure::auth::JwtConfig;
    use crate::infrastructure::storage::StorageConfig;

    pub const TEST_JWT_SECRET: &str = "test-secret";

    /// In-memory state for handler and router tests
    pub async fn test_state() -> AppState {
        let storage = StorageHandle::connect(&StorageConfig::in_memory())
            .await
            .unwrap();

        AppState::new(storage, JwtService::new(JwtConfig::new(TEST_JWT_SECRET, 1)))
    }

    pub fn admin_bearer(state: &AppState) -> String {
        format!("Bearer {}", state.jwt.generate_admin_token("test-admin").unwrap())
    }
}
