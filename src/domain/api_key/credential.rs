//! Presented credential format: `<prefix>.<secret>`

use thiserror::Error;

/// Separator between the public prefix and the secret half
pub const CREDENTIAL_SEPARATOR: char = '.';

/// Why a presented credential could not be split. Never shown to callers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CredentialParseError {
    #[error("credential has no separator")]
    MissingSeparator,

    #[error("credential prefix is empty")]
    EmptyPrefix,

    #[error("credential secret is empty")]
    EmptySecret,
}

/// A credential split into its lookup prefix and secret half
#[derive(Clone, PartialEq, Eq)]
pub struct ParsedCredential<'a> {
    prefix: &'a str,
    secret: &'a str,
}

impl<'a> ParsedCredential<'a> {
    /// Split at the first separator; any further dots belong to the secret.
    pub fn parse(raw: &'a str) -> Result<Self, CredentialParseError> {
        let (prefix, secret) = raw
            .split_once(CREDENTIAL_SEPARATOR)
            .ok_or(CredentialParseError::MissingSeparator)?;

        if prefix.is_empty() {
            return Err(CredentialParseError::EmptyPrefix);
        }

        if secret.is_empty() {
            return Err(CredentialParseError::EmptySecret);
        }

        Ok(Self { prefix, secret })
    }

    pub fn prefix(&self) -> &'a str {
        self.prefix
    }

    pub fn secret(&self) -> &'a str {
        self.secret
    }

    /// Material the stored hash is computed over: prefix and secret, no separator
    pub fn hash_input(&self) -> String {
        format!("{}{}", self.prefix, self.secret)
    }
}

impl std::fmt::Debug for ParsedCredential<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedCredential")
            .field("prefix", &self.prefix)
            .field("secret", &"[hidden]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let parsed = ParsedCredential::parse("0a1b2c3d.ffee").unwrap();
        assert_eq!(parsed.prefix(), "0a1b2c3d");
        assert_eq!(parsed.secret(), "ffee");
        assert_eq!(parsed.hash_input(), "0a1b2c3dffee");
    }

    #[test]
    fn test_parse_extra_dots_belong_to_secret() {
        let parsed = ParsedCredential::parse("abc.def.ghi").unwrap();
        assert_eq!(parsed.prefix(), "abc");
        assert_eq!(parsed.secret(), "def.ghi");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            ParsedCredential::parse("not-a-valid-key"),
            Err(CredentialParseError::MissingSeparator)
        );
        assert_eq!(
            ParsedCredential::parse(".secret"),
            Err(CredentialParseError::EmptyPrefix)
        );
        assert_eq!(
            ParsedCredential::parse("prefix."),
            Err(CredentialParseError::EmptySecret)
        );
        assert_eq!(ParsedCredential::parse(""), Err(CredentialParseError::MissingSeparator));
    }

    #[test]
    fn test_debug_hides_secret() {
        let parsed = ParsedCredential::parse("0a1b2c3d.topsecret").unwrap();
        assert!(!format!("{:?}", parsed).contains("topsecret"));
    }
}
