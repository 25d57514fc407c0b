//! API Key service
//!
//! Issuance, listing and deactivation of API keys. This is the only writer
//! of key rows besides the verifier's last-used bump.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::api_key::{
    validate_api_key_name, ApiKey, ApiKeyId, ApiKeyRepository, ApiKeySummary, IssuedApiKey,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_api_key_issued;

use super::generator::ApiKeyGenerator;

/// API Key service for managing API keys
pub struct ApiKeyService {
    repository: Arc<dyn ApiKeyRepository>,
    generator: ApiKeyGenerator,
}

impl std::fmt::Debug for ApiKeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyService")
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

impl ApiKeyService {
    /// Create a new API key service
    pub fn new(repository: Arc<dyn ApiKeyRepository>) -> Self {
        Self {
            repository,
            generator: ApiKeyGenerator::new(),
        }
    }

    /// Issue a new key. The returned raw key is never retrievable again.
    pub async fn issue(
        &self,
        name: &str,
        user_id: Option<&str>,
    ) -> Result<IssuedApiKey, DomainError> {
        validate_api_key_name(name).map_err(|e| DomainError::validation(e.to_string()))?;

        let generated = self.generator.generate();
        let mut api_key = ApiKey::new(ApiKeyId::generate(), name, &generated.prefix, &generated.hash);

        if let Some(user_id) = user_id {
            api_key = api_key.with_user_id(user_id);
        }

        let created = self.repository.create(api_key).await.map_err(|e| {
            warn!(error = %e, "Failed to persist API key");
            match e {
                DomainError::Storage { .. } => e,
                other => DomainError::storage(other.to_string()),
            }
        })?;

        record_api_key_issued();
        info!(
            key_id = %created.id(),
            prefix = %created.key_prefix(),
            owned = created.user_id().is_some(),
            "API key issued"
        );

        Ok(IssuedApiKey {
            id: *created.id(),
            name: created.name().to_string(),
            key: generated.key,
        })
    }

    /// Get a key summary by ID
    pub async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKeySummary>, DomainError> {
        Ok(self.repository.get(id).await?.map(|key| key.summary()))
    }

    /// List keys newest first
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<ApiKeySummary>, DomainError> {
        let keys = self.repository.list(include_inactive).await?;
        Ok(keys.iter().map(ApiKey::summary).collect())
    }

    /// Deactivate a key; true if it exists, including when already inactive
    pub async fn deactivate(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let affected = self.repository.deactivate(id).await?;

        if affected {
            info!(key_id = %id, "API key deactivated");
        }

        Ok(affected)
    }
}
