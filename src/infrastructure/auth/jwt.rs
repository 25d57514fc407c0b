//! JWT token generation and validation for administrative access

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Role claim carried by administrator tokens
pub const ADMIN_ROLE: &str = "admin";

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (operator identifier)
    pub sub: String,
    pub role: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl JwtClaims {
    /// Create new claims for a subject and role
    pub fn new(subject: impl Into<String>, role: impl Into<String>, expiration_hours: u64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours as i64);

        Self {
            sub: subject.into(),
            role: role.into(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Configuration for JWT service
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration time in hours
    pub expiration_hours: u64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiration_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            expiration_hours: 24,
        }
    }
}

/// HS256 JWT service
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_hours", &self.config.expiration_hours)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a token for an administrator
    pub fn generate_admin_token(&self, subject: &str) -> Result<String, DomainError> {
        let claims = JwtClaims::new(subject, ADMIN_ROLE, self.config.expiration_hours);
        self.generate(&claims)
    }

    pub fn generate(&self, claims: &JwtClaims) -> Result<String, DomainError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))
    }

    /// Validate signature and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<JwtClaims, DomainError> {
        let validation = Validation::default();

        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| DomainError::credential(format!("Invalid JWT: {}", e)))?;

        Ok(token_data.claims)
    }

    pub fn expiration_hours(&self) -> u64 {
        self.config.expiration_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig::new("test-secret", 1))
    }

    #[test]
    fn test_admin_token_round_trip() {
        let service = service();
        let token = service.generate_admin_token("ops@example.com").unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.sub, "ops@example.com");
        assert!(claims.is_admin());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_non_admin_role() {
        let service = service();
        let token = service
            .generate(&JwtClaims::new("viewer", "viewer", 1))
            .unwrap();

        assert!(!service.validate(&token).unwrap().is_admin());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().generate_admin_token("ops").unwrap();
        let other = JwtService::new(JwtConfig::new("other-secret", 1));

        assert!(matches!(
            other.validate(&token),
            Err(DomainError::Credential { .. })
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = service();
        let mut claims = JwtClaims::new("ops", ADMIN_ROLE, 1);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        let token = service.generate(&claims).unwrap();

        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_debug_hides_keys() {
        let debug = format!("{:?}", service());
        assert!(!debug.contains("test-secret"));
    }
}
