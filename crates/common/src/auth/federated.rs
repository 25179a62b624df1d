//! Federated-identity token verification.
//!
//! Tokens are `base64url(payload_json).base64url(signature)` where the
//! signature is Ed25519 over the raw payload bytes, issued by the external
//! identity provider. Verification is pure computation (no network), so it
//! may run on any request thread. The subject allow-list is maintained by a
//! separate collaborator and checked by the caller after verification.

use std::collections::BTreeSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("malformed identity token")]
    Malformed,
    #[error("invalid identity provider key")]
    InvalidKey,
    #[error("identity token signature verification failed")]
    BadSignature,
    #[error("identity token expired")]
    Expired,
}

/// Claims carried by a verified identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Stable subject identifier at the identity provider.
    pub sub: String,
    /// Expiry as unix seconds.
    pub exp: i64,
}

/// Verifies identity tokens against the provider's public key.
#[derive(Debug, Clone)]
pub struct IdentityVerifier {
    key: VerifyingKey,
}

impl IdentityVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Build a verifier from the hex-encoded 32-byte provider key, as it
    /// appears in configuration.
    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        let bytes = hex::decode(s).map_err(|_| IdentityError::InvalidKey)?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            bytes.try_into().map_err(|_| IdentityError::InvalidKey)?;
        VerifyingKey::from_bytes(&bytes)
            .map(Self::new)
            .map_err(|_| IdentityError::InvalidKey)
    }

    /// Decode and verify one token, returning its claims.
    pub fn verify(&self, token: &str, now: OffsetDateTime) -> Result<IdentityClaims, IdentityError> {
        let (payload_b64, sig_b64) = token.split_once('.').ok_or(IdentityError::Malformed)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| IdentityError::Malformed)?;
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| IdentityError::Malformed)?;
        let signature =
            Signature::from_slice(&sig_bytes).map_err(|_| IdentityError::Malformed)?;

        self.key
            .verify_strict(&payload, &signature)
            .map_err(|_| IdentityError::BadSignature)?;

        let claims: IdentityClaims =
            serde_json::from_slice(&payload).map_err(|_| IdentityError::Malformed)?;
        if claims.exp <= now.unix_timestamp() {
            return Err(IdentityError::Expired);
        }
        Ok(claims)
    }
}

/// Subjects permitted past federated-identity rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    subjects: BTreeSet<String>,
}

impl AllowList {
    pub fn new(subjects: impl IntoIterator<Item = String>) -> Self {
        Self {
            subjects: subjects.into_iter().collect(),
        }
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.subjects.contains(subject)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}
