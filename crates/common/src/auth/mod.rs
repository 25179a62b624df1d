//! Credential material for password-protected subtrees.
//!
//! A stored credential is `salt.digest` where the digest is
//! `SHA-256(salt || "\n" || password)`. Every comparison that touches
//! credential material goes through [`constant_time_eq`]; there is no
//! short-circuiting string comparison anywhere on the secret path.
//!
//! The session artifact a successful login sets is the stored token itself,
//! scoped to one rule by cookie name and checked on later requests with the
//! same constant-time routine.

pub mod federated;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// Lifetime of the per-rule session artifact.
pub const SESSION_TTL: time::Duration = time::Duration::days(30);

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("malformed credential token")]
    Malformed,
    #[error("failed to generate salt: {0}")]
    Salt(String),
}

/// Salted, hashed credential for one protection rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialToken {
    salt: String,
    digest: String,
}

impl CredentialToken {
    /// Hash a new password under a fresh random salt.
    pub fn derive(password: &str) -> Result<Self, CredentialError> {
        let mut salt = [0u8; SALT_SIZE];
        getrandom::getrandom(&mut salt).map_err(|e| CredentialError::Salt(e.to_string()))?;
        Ok(Self::derive_with_salt(&salt, password))
    }

    pub fn derive_with_salt(salt: &[u8], password: &str) -> Self {
        Self {
            salt: hex::encode(salt),
            digest: digest_hex(salt, password),
        }
    }

    /// Check a submitted password against the stored digest.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(salt) = hex::decode(&self.salt) else {
            return false;
        };
        constant_time_eq(
            digest_hex(&salt, password).as_bytes(),
            self.digest.as_bytes(),
        )
    }

    /// Check a presented session artifact, which holds the token verbatim.
    pub fn matches_artifact(&self, presented: &str) -> bool {
        constant_time_eq(presented.as_bytes(), self.to_string().as_bytes())
    }
}

impl fmt::Display for CredentialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.salt, self.digest)
    }
}

impl FromStr for CredentialToken {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (salt, digest) = s.split_once('.').ok_or(CredentialError::Malformed)?;
        if salt.is_empty() || digest.is_empty() {
            return Err(CredentialError::Malformed);
        }
        if hex::decode(salt).is_err() || hex::decode(digest).is_err() {
            return Err(CredentialError::Malformed);
        }
        Ok(Self {
            salt: salt.to_string(),
            digest: digest.to_string(),
        })
    }
}

impl TryFrom<String> for CredentialToken {
    type Error = CredentialError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CredentialToken> for String {
    fn from(token: CredentialToken) -> Self {
        token.to_string()
    }
}

fn digest_hex(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(b"\n");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time byte equality. Length mismatch returns false without
/// inspecting contents; lengths of credential material are not secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Cookie name for the session artifact scoped to one rule.
pub fn session_cookie_name(rule_id: &Uuid) -> String {
    format!("waypost_session_{}", rule_id.simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_and_verify() {
        let token = CredentialToken::derive("open sesame").unwrap();
        assert!(token.verify("open sesame"));
        assert!(!token.verify("open sesame "));
        assert!(!token.verify(""));
    }

    #[test]
    fn test_same_password_different_salts_differ() {
        let a = CredentialToken::derive_with_salt(&[1u8; SALT_SIZE], "pw");
        let b = CredentialToken::derive_with_salt(&[2u8; SALT_SIZE], "pw");
        assert_ne!(a, b);
        assert!(a.verify("pw"));
        assert!(b.verify("pw"));
    }

    #[test]
    fn test_token_string_round_trip() {
        let token = CredentialToken::derive_with_salt(&[7u8; SALT_SIZE], "hunter2");
        let parsed: CredentialToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        assert!("".parse::<CredentialToken>().is_err());
        assert!("nodot".parse::<CredentialToken>().is_err());
        assert!(".digestonly".parse::<CredentialToken>().is_err());
        assert!("saltonly.".parse::<CredentialToken>().is_err());
        assert!("notxhex.aabb".parse::<CredentialToken>().is_err());
    }

    #[test]
    fn test_artifact_match_is_whole_token() {
        let token = CredentialToken::derive_with_salt(&[9u8; SALT_SIZE], "pw");
        let artifact = token.to_string();
        assert!(token.matches_artifact(&artifact));
        assert!(!token.matches_artifact(&artifact[1..]));
        assert!(!token.matches_artifact(""));
    }

    #[test]
    fn test_constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_session_cookie_name_is_rule_scoped() {
        let a = session_cookie_name(&Uuid::from_u128(1));
        let b = session_cookie_name(&Uuid::from_u128(2));
        assert_ne!(a, b);
        assert!(a.starts_with("waypost_session_"));
    }
}
