//! Usage record entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::api_key::ApiKeyId;

/// Placeholder for request metadata that was not supplied
pub const UNKNOWN: &str = "unknown";

/// Unique identifier for a usage record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageRecordId(Uuid);

impl UsageRecordId {
    /// Generate a new unique ID
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

impl std::fmt::Display for UsageRecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One accounting entry per gated request attempt that maps to a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    id: UsageRecordId,
    /// Key that attempted the request
    pub key_id: ApiKeyId,
    /// Request path, verbatim
    pub endpoint: String,
    pub method: String,
    /// 401 on rejection, 500 on handler fault, otherwise the handler's status
    pub status_code: u16,
    /// Gate entry to response, authorization included
    pub response_time_ms: u64,
    pub ip_address: String,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
}

impl UsageRecord {
    /// Create a new usage record stamped with the current time
    pub fn new(
        key_id: ApiKeyId,
        endpoint: impl Into<String>,
        method: impl Into<String>,
        status_code: u16,
    ) -> Self {
        Self {
            id: UsageRecordId::generate(),
            key_id,
            endpoint: endpoint.into(),
            method: method.into(),
            status_code,
            response_time_ms: 0,
            ip_address: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Set the measured response time
    pub fn with_response_time_ms(mut self, response_time_ms: u64) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = ip_address.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Rehydrate with a stored identifier
    pub fn with_id(mut self, id: UsageRecordId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &UsageRecordId {
        &self.id
    }

    /// Whether the status falls in `[200, 300)`
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Calendar day bucket, `YYYY-MM-DD` in UTC
    pub fn day(&self) -> String {
        self.timestamp.date_naive().format("%Y-%m-%d").to_string()
    }
}
