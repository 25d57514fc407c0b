//! Key verification
//!
//! Two questions are answered separately: which key a credential belongs to
//! (regardless of state), and whether it currently authorizes access.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::api_key::{ActiveFilter, ApiKeyId, ApiKeyRepository, ParsedCredential};

use super::generator::ApiKeyGenerator;

/// Outcome of checking a presented credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// Active key matched
    Granted(ApiKeyId),
    /// Rejected; carries the key id when the credential maps to a known key
    Denied(Option<ApiKeyId>),
}

/// Verifies presented credentials against stored keys
pub struct KeyVerifier {
    repository: Arc<dyn ApiKeyRepository>,
    generator: ApiKeyGenerator,
}

impl std::fmt::Debug for KeyVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVerifier").finish_non_exhaustive()
    }
}

impl KeyVerifier {
    pub fn new(repository: Arc<dyn ApiKeyRepository>) -> Self {
        Self {
            repository,
            generator: ApiKeyGenerator::new(),
        }
    }

    /// Map a credential to its key id, ignoring `active`.
    ///
    /// Malformed credentials return `None` without touching storage.
    pub async fn resolve_key_id(&self, raw: &str) -> Option<ApiKeyId> {
        let credential = ParsedCredential::parse(raw).ok()?;
        let hash = self.generator.hash_credential(&credential);

        match self
            .repository
            .find_by_credential(credential.prefix(), &hash, ActiveFilter::Any)
            .await
        {
            Ok(key) => key.map(|k| *k.id()),
            Err(e) => {
                warn!(prefix = %credential.prefix(), error = %e, "Key id lookup failed");
                None
            }
        }
    }

    /// Whether the credential matches an active key; bumps last-used on success.
    pub async fn verify(&self, raw: &str) -> bool {
        self.verified_key_id(raw).await.is_some()
    }

    /// Verify, then resolve on failure, so the caller can attribute rejections
    pub async fn authorize(&self, raw: &str) -> Authorization {
        match self.verified_key_id(raw).await {
            Some(id) => Authorization::Granted(id),
            None => Authorization::Denied(self.resolve_key_id(raw).await),
        }
    }

    async fn verified_key_id(&self, raw: &str) -> Option<ApiKeyId> {
        let credential = match ParsedCredential::parse(raw) {
            Ok(credential) => credential,
            Err(e) => {
                debug!(reason = %e, "Rejected malformed credential");
                return None;
            }
        };
        let hash = self.generator.hash_credential(&credential);

        let key = match self
            .repository
            .find_by_credential(credential.prefix(), &hash, ActiveFilter::ActiveOnly)
            .await
        {
            Ok(Some(key)) => key,
            Ok(None) => {
                debug!(prefix = %credential.prefix(), "No active key matched credential");
                return None;
            }
            Err(e) => {
                warn!(prefix = %credential.prefix(), error = %e, "Key verification lookup failed");
                return None;
            }
        };

        if let Err(e) = self.repository.touch_last_used(key.id(), Utc::now()).await {
            warn!(key_id = %key.id(), error = %e, "Failed to update API key last_used");
        }

        Some(*key.id())
    }
}
