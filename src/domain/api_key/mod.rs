//! API Key domain
//!
//! Entities, credential parsing and the repository contract for issued
//! API keys.

mod credential;
mod entity;
mod repository;
mod validation;

pub use credential::{CredentialParseError, ParsedCredential, CREDENTIAL_SEPARATOR};
pub use entity::{ApiKey, ApiKeyId, ApiKeySummary, IssuedApiKey};
#[cfg(test)]
pub use repository::MockApiKeyRepository;
pub use repository::{ActiveFilter, ApiKeyRepository};
pub use validation::{validate_api_key_name, ApiKeyValidationError, MAX_API_KEY_NAME_LENGTH};
