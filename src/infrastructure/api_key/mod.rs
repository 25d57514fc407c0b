//! API Key infrastructure
//!
//! Key generation, storage adapters, the issuing service and the verifier.

mod generator;
mod postgres_repository;
mod repository;
mod service;
mod verifier;

pub use generator::{
    constant_time_compare, hash_key, ApiKeyGenerator, GeneratedApiKey, KEY_BYTES, PREFIX_LEN,
};
pub use postgres_repository::PostgresApiKeyRepository;
pub use repository::InMemoryApiKeyRepository;
pub use service::ApiKeyService;
pub use verifier::{Authorization, KeyVerifier};
