//! In-memory API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::api_key::{ActiveFilter, ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

use super::generator::constant_time_compare;

/// In-memory implementation of ApiKeyRepository
#[derive(Debug, Default)]
pub struct InMemoryApiKeyRepository {
    keys: Arc<RwLock<HashMap<ApiKeyId, ApiKey>>>,
}

impl InMemoryApiKeyRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        let mut keys = self.keys.write().await;

        if keys.contains_key(api_key.id()) {
            return Err(DomainError::storage(format!(
                "API key with ID '{}' already exists",
                api_key.id()
            )));
        }

        keys.insert(*api_key.id(), api_key.clone());
        Ok(api_key)
    }

    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.get(id).cloned())
    }

    async fn find_by_credential(
        &self,
        prefix: &str,
        key_hash: &str,
        filter: ActiveFilter,
    ) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().await;

        let found = keys.values().find(|key| {
            key.key_prefix() == prefix
                && constant_time_compare(key.key_hash(), key_hash)
                && (filter == ActiveFilter::Any || key.is_active())
        });

        Ok(found.cloned())
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<ApiKey>, DomainError> {
        let keys = self.keys.read().await;

        let mut result: Vec<ApiKey> = keys
            .values()
            .filter(|key| include_inactive || key.is_active())
            .cloned()
            .collect();

        result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(result)
    }

    async fn deactivate(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let mut keys = self.keys.write().await;

        match keys.get_mut(id) {
            Some(key) => {
                key.deactivate();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_used(&self, id: &ApiKeyId, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut keys = self.keys.write().await;

        if let Some(key) = keys.get_mut(id) {
            key.touch(at);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_key(name: &str, prefix: &str, hash: &str) -> ApiKey {
        ApiKey::new(ApiKeyId::generate(), name, prefix, hash)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryApiKeyRepository::new();
        let key = create_test_key("Test Key", "0a1b2c3d", "hash1");
        let id = *key.id();

        repo.create(key).await.unwrap();

        let retrieved = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(retrieved.name(), "Test Key");
    }

    #[tokio::test]
    async fn test_find_by_credential_respects_filter() {
        let repo = InMemoryApiKeyRepository::new();
        let key = create_test_key("k", "0a1b2c3d", "hash1");
        let id = *key.id();
        repo.create(key).await.unwrap();
        repo.deactivate(&id).await.unwrap();

        let any = repo
            .find_by_credential("0a1b2c3d", "hash1", ActiveFilter::Any)
            .await
            .unwrap();
        let active = repo
            .find_by_credential("0a1b2c3d", "hash1", ActiveFilter::ActiveOnly)
            .await
            .unwrap();

        assert_eq!(any.map(|k| *k.id()), Some(id));
        assert!(active.is_none());
    }

    #[tokio::test]
    async fn test_find_by_credential_requires_both_fields() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(create_test_key("k", "0a1b2c3d", "hash1"))
            .await
            .unwrap();

        let wrong_hash = repo
            .find_by_credential("0a1b2c3d", "hash2", ActiveFilter::Any)
            .await
            .unwrap();
        let wrong_prefix = repo
            .find_by_credential("ffffffff", "hash1", ActiveFilter::Any)
            .await
            .unwrap();

        assert!(wrong_hash.is_none());
        assert!(wrong_prefix.is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_and_filtered() {
        let repo = InMemoryApiKeyRepository::new();
        let now = Utc::now();

        let old = create_test_key("old", "00000001", "h1").with_created_at(now - Duration::hours(2));
        let mid = create_test_key("mid", "00000002", "h2").with_created_at(now - Duration::hours(1));
        let new = create_test_key("new", "00000003", "h3").with_created_at(now);
        let mid_id = *mid.id();

        repo.create(mid).await.unwrap();
        repo.create(old).await.unwrap();
        repo.create(new).await.unwrap();
        repo.deactivate(&mid_id).await.unwrap();

        let all: Vec<String> = repo
            .list(true)
            .await
            .unwrap()
            .iter()
            .map(|k| k.name().to_string())
            .collect();
        assert_eq!(all, vec!["new", "mid", "old"]);

        let active: Vec<String> = repo
            .list(false)
            .await
            .unwrap()
            .iter()
            .map(|k| k.name().to_string())
            .collect();
        assert_eq!(active, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_deactivate_idempotent_and_missing() {
        let repo = InMemoryApiKeyRepository::new();
        let key = create_test_key("k", "0a1b2c3d", "hash1");
        let id = *key.id();
        repo.create(key).await.unwrap();

        assert!(repo.deactivate(&id).await.unwrap());
        assert!(repo.deactivate(&id).await.unwrap());
        assert!(!repo.get(&id).await.unwrap().unwrap().is_active());
        assert!(!repo.deactivate(&ApiKeyId::generate()).await.unwrap());
    }

    #[tokio::test]
    async fn test_touch_last_used() {
        let repo = InMemoryApiKeyRepository::new();
        let key = create_test_key("k", "0a1b2c3d", "hash1");
        let id = *key.id();
        repo.create(key).await.unwrap();

        let at = Utc::now();
        repo.touch_last_used(&id, at).await.unwrap();

        assert_eq!(repo.get(&id).await.unwrap().unwrap().last_used_at(), Some(at));
    }
}
