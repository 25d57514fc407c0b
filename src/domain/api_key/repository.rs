//! API Key repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::entity::{ApiKey, ApiKeyId};
use crate::domain::DomainError;

/// Lookup filter applied to the `active` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveFilter {
    /// Match regardless of `active`; used for usage attribution
    Any,
    /// Match only keys with `active = true`; used for authorization
    ActiveOnly,
}

/// Repository trait for API key storage
///
/// Implementations are the only writers of the key table.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Persist a newly issued key
    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError>;

    /// Get an API key by its ID
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// Find the key matching both prefix and hash
    async fn find_by_credential(
        &self,
        prefix: &str,
        key_hash: &str,
        filter: ActiveFilter,
    ) -> Result<Option<ApiKey>, DomainError>;

    /// List keys newest first, optionally including deactivated ones
    async fn list(&self, include_inactive: bool) -> Result<Vec<ApiKey>, DomainError>;

    /// Set `active = false`; returns whether the row exists
    async fn deactivate(&self, id: &ApiKeyId) -> Result<bool, DomainError>;

    /// Bump the last-used timestamp
    async fn touch_last_used(&self, id: &ApiKeyId, at: DateTime<Utc>) -> Result<(), DomainError>;
}
