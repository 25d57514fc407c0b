//! Domain layer - Core business logic and entities

pub mod api_key;
pub mod error;
pub mod usage;

pub use api_key::{
    ActiveFilter, ApiKey, ApiKeyId, ApiKeyRepository, ApiKeySummary, ApiKeyValidationError,
    CredentialParseError, IssuedApiKey, ParsedCredential,
};
pub use error::DomainError;
pub use usage::{UsageQuery, UsageRecord, UsageRecordId, UsageRepository, UsageStats};
