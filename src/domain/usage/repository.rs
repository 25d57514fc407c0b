//! Usage repository trait

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::UsageRecord;
use crate::domain::api_key::ApiKeyId;
use crate::domain::DomainError;

/// Query parameters for usage records
#[derive(Debug, Clone, Default)]
pub struct UsageQuery {
    /// Filter by API key
    pub key_id: Option<ApiKeyId>,
    /// Start timestamp (inclusive)
    pub since: Option<DateTime<Utc>>,
}

impl UsageQuery {
    /// Create a new query
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by API key
    pub fn with_key(mut self, key_id: ApiKeyId) -> Self {
        self.key_id = Some(key_id);
        self
    }

    /// Only records at or after `since`
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Whether a record satisfies this query
    pub fn matches(&self, record: &UsageRecord) -> bool {
        if let Some(key_id) = &self.key_id {
            if record.key_id != *key_id {
                return false;
            }
        }

        if let Some(since) = self.since {
            if record.timestamp < since {
                return false;
            }
        }

        true
    }
}

/// Repository for usage records
///
/// Records form an unordered bag; callers must not rely on insertion order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Append a usage record
    async fn record(&self, record: UsageRecord) -> Result<(), DomainError>;

    /// Records matching the query
    async fn query(&self, query: &UsageQuery) -> Result<Vec<UsageRecord>, DomainError>;

    /// Record count per key at or after `since`
    async fn count_by_key(
        &self,
        since: DateTime<Utc>,
    ) -> Result<HashMap<ApiKeyId, u64>, DomainError>;
}
