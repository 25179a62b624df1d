//! Canonical content identifiers.
//!
//! The upstream content service assigns every node an opaque id. Ids show up
//! in several surface forms (dashed, bare, mixed case); internally they are
//! always held canonicalized, and the canonical wire form is 32 lowercase hex
//! characters with separators stripped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the canonical bare-hex form.
pub const PAGE_ID_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum PageIdError {
    #[error("invalid content id: {0:?}")]
    Invalid(String),
}

/// Opaque, stable identifier for a node in the upstream content tree,
/// independent of the node's current URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageId(Uuid);

impl PageId {
    /// Parse a bare id: exactly 32 hex characters, no separators.
    ///
    /// This is the strict form used when deciding whether a request path is
    /// a raw content-id lookup; admin and artifact inputs go through the
    /// lenient [`FromStr`] parse instead.
    pub fn parse_bare(s: &str) -> Result<Self, PageIdError> {
        if s.len() != PAGE_ID_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PageIdError::Invalid(s.to_string()));
        }
        Uuid::try_parse(s)
            .map(PageId)
            .map_err(|_| PageIdError::Invalid(s.to_string()))
    }
}

impl FromStr for PageId {
    type Err = PageIdError;

    /// Lenient parse: separators are stripped before validation, so both
    /// dashed and bare forms are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| *c != '-').collect();
        Self::parse_bare(&cleaned)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl From<Uuid> for PageId {
    fn from(uuid: Uuid) -> Self {
        PageId(uuid)
    }
}

impl TryFrom<String> for PageId {
    type Error = PageIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PageId> for String {
    fn from(id: PageId) -> Self {
        id.to_string()
    }
}
