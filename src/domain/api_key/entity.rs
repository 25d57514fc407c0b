//! API Key entity and related types

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::ApiKeyValidationError;

/// API Key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(Uuid);

impl ApiKeyId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for ApiKeyId {
    type Err = ApiKeyValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ApiKeyValidationError::InvalidId(s.to_string()))
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// API Key entity
///
/// Only the prefix and the hash of the raw key are kept; the secret half is
/// unrecoverable once issuance returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    id: ApiKeyId,
    name: String,
    /// First 8 hex characters of the raw key, stored in clear text for lookup
    key_prefix: String,
    /// Hex SHA-256 of prefix and secret concatenated without separator
    key_hash: String,
    active: bool,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_used_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl ApiKey {
    /// Create a new, active API key
    pub fn new(
        id: ApiKeyId,
        name: impl Into<String>,
        key_prefix: impl Into<String>,
        key_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            key_prefix: key_prefix.into(),
            key_hash: key_hash.into(),
            active: true,
            created_at: Utc::now(),
            last_used_at: None,
            user_id: None,
        }
    }

    /// Set owner
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Override the creation timestamp (used when rehydrating from storage)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_last_used_at(mut self, last_used_at: Option<DateTime<Utc>>) -> Self {
        self.last_used_at = last_used_at;
        self
    }

    // Getters

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn key_hash(&self) -> &str {
        &self.key_hash
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    // Mutations

    /// Soft delete; keys are never physically removed
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_used_at = Some(at);
    }

    /// Hash-free projection safe to hand to callers
    pub fn summary(&self) -> ApiKeySummary {
        ApiKeySummary {
            id: self.id,
            name: self.name.clone(),
            prefix: self.key_prefix.clone(),
            active: self.active,
            created_at: self.created_at,
            last_used: self.last_used_at,
            user_id: self.user_id.clone(),
        }
    }
}

/// API key as listed to administrators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeySummary {
    pub id: ApiKeyId,
    pub name: String,
    pub prefix: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
}

/// Result of issuing a key. `key` is the only copy of the raw credential.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedApiKey {
    pub id: ApiKeyId,
    pub name: String,
    pub key: String,
}

impl std::fmt::Debug for IssuedApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedApiKey")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("key", &"[hidden]")
            .finish()
    }
}
