//! API Key generation
//!
//! Keys are 32 random bytes rendered as 64 lowercase hex characters. The
//! first 8 characters form the public lookup prefix; the stored hash covers
//! all 64 characters.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::api_key::{ParsedCredential, CREDENTIAL_SEPARATOR};

/// Number of random bytes behind each key
pub const KEY_BYTES: usize = 32;

/// Hex characters kept in clear text as the lookup prefix
pub const PREFIX_LEN: usize = 8;

/// Result of generating a new API key
#[derive(Clone)]
pub struct GeneratedApiKey {
    /// The full `prefix.secret` credential (only shown once at creation)
    pub key: String,
    /// The key prefix for lookup
    pub prefix: String,
    /// The hashed key for storage
    pub hash: String,
}

impl std::fmt::Debug for GeneratedApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedApiKey")
            .field("key", &"[hidden]")
            .field("prefix", &self.prefix)
            .field("hash", &self.hash)
            .finish()
    }
}

/// Generator for API keys
#[derive(Debug, Clone, Default)]
pub struct ApiKeyGenerator;

impl ApiKeyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a new API key
    pub fn generate(&self) -> GeneratedApiKey {
        let mut random_bytes = [0u8; KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        self.from_material(&hex::encode(random_bytes))
    }

    /// Build a key from known hex material (for deterministic tests)
    pub fn from_material(&self, material: &str) -> GeneratedApiKey {
        let split = PREFIX_LEN.min(material.len());
        let (prefix, secret) = material.split_at(split);

        GeneratedApiKey {
            key: format!("{}{}{}", prefix, CREDENTIAL_SEPARATOR, secret),
            prefix: prefix.to_string(),
            hash: hash_key(material),
        }
    }

    /// Hash a parsed credential the same way issuance did
    pub fn hash_credential(&self, credential: &ParsedCredential<'_>) -> String {
        hash_key(&credential.hash_input())
    }
}

/// Lowercase hex SHA-256 of the raw key material
pub fn hash_key(material: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_format() {
        let generated = ApiKeyGenerator::new().generate();
        let (prefix, secret) = generated.key.split_once('.').unwrap();

        assert_eq!(prefix.len(), 8);
        assert_eq!(secret.len(), 56);
        assert_eq!(generated.prefix, prefix);
        assert!(prefix.chars().chain(secret.chars()).all(|c| c.is_ascii_hexdigit()));
        assert_eq!(generated.hash.len(), 64);
    }

    #[test]
    fn test_hash_covers_prefix_and_secret() {
        let generated = ApiKeyGenerator::new().generate();
        let material = generated.key.replace('.', "");

        assert_eq!(generated.hash, hash_key(&material));
        assert!(!generated.hash.contains(&material));
    }

    #[test]
    fn test_parsed_credential_hash_matches_issued_hash() {
        let generator = ApiKeyGenerator::new();
        let generated = generator.generate();
        let parsed = ParsedCredential::parse(&generated.key).unwrap();

        assert_eq!(generator.hash_credential(&parsed), generated.hash);
    }

    #[test]
    fn test_key_uniqueness() {
        let generator = ApiKeyGenerator::new();
        let key1 = generator.generate();
        let key2 = generator.generate();

        assert_ne!(key1.key, key2.key);
        assert_ne!(key1.hash, key2.hash);
    }

    #[test]
    fn test_known_hash() {
        // sha256("abc")
        assert_eq!(
            hash_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_from_material() {
        let material = "0123456789abcdef".repeat(4);
        let generated = ApiKeyGenerator::new().from_material(&material);

        assert_eq!(generated.prefix, "01234567");
        assert_eq!(generated.key, format!("01234567.{}", &material[8..]));
    }

    #[test]
    fn test_debug_hides_key() {
        let generated = ApiKeyGenerator::new().generate();
        assert!(!format!("{:?}", generated).contains(&generated.key));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }
}
