//! Protection rules: which subtrees require authentication.
//!
//! A rule is keyed by content id, by raw path, or both. Id-keyed rules are
//! resolved through the page hierarchy (robust to later route overrides);
//! path-keyed rules back them up when no content id can be resolved.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CredentialToken;
use crate::id::PageId;

fn default_true() -> bool {
    true
}

/// How a path-keyed rule matches request paths.
///
/// Note that `Exact` describes match *precision*, not scope: an exact rule
/// still protects the entire subtree rooted at its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    Prefix,
}

/// The authentication mechanism a rule demands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Password,
    FederatedIdentity,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown auth mode: {0:?}")]
pub struct UnknownAuthMode(pub String);

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Password => "password",
            AuthMode::FederatedIdentity => "federated-identity",
        }
    }
}

impl FromStr for AuthMode {
    type Err = UnknownAuthMode;

    /// Strict parse, used on the write path: unknown modes are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(AuthMode::Password),
            "federated-identity" => Ok(AuthMode::FederatedIdentity),
            other => Err(UnknownAuthMode(other.to_string())),
        }
    }
}

impl Serialize for AuthMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuthMode {
    /// Lenient decode, used on the read path: an unrecognized mode in a
    /// snapshot fails toward requiring a credential, not toward open access.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or(AuthMode::Password))
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A policy requiring authentication before a path/subtree is served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedRule {
    pub id: Uuid,
    #[serde(default)]
    pub page_id: Option<PageId>,
    #[serde(default)]
    pub path: String,
    pub match_mode: MatchMode,
    pub auth_mode: AuthMode,
    /// Salted/hashed token for `password` rules; absent for
    /// `federated-identity`, which checks signed identity tokens instead.
    #[serde(default, rename = "credentialToken", skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialToken>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Read-side mirror of the protection table with id and page indexes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ProtectedRule>", into = "Vec<ProtectedRule>")]
pub struct ProtectionStore {
    rules: Vec<ProtectedRule>,
    by_page: BTreeMap<PageId, usize>,
    by_rule: BTreeMap<Uuid, usize>,
}

impl ProtectionStore {
    pub fn new(rules: Vec<ProtectedRule>) -> Self {
        let mut by_page = BTreeMap::new();
        let mut by_rule = BTreeMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            by_rule.entry(rule.id).or_insert(idx);
            if !rule.enabled {
                continue;
            }
            if let Some(page_id) = rule.page_id {
                by_page.entry(page_id).or_insert(idx);
            }
        }
        Self {
            rules,
            by_page,
            by_rule,
        }
    }

    /// Enabled rule keyed to exactly this page, if any.
    pub fn rule_for_page(&self, page_id: &PageId) -> Option<&ProtectedRule> {
        self.by_page.get(page_id).map(|idx| &self.rules[*idx])
    }

    pub fn rule(&self, rule_id: &Uuid) -> Option<&ProtectedRule> {
        self.by_rule.get(rule_id).map(|idx| &self.rules[*idx])
    }

    /// Enabled rules carrying a path key, for the prefix strategy.
    pub fn path_rules(&self) -> impl Iterator<Item = &ProtectedRule> {
        self.rules.iter().filter(|r| r.enabled && !r.path.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtectedRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<Vec<ProtectedRule>> for ProtectionStore {
    fn from(rules: Vec<ProtectedRule>) -> Self {
        Self::new(rules)
    }
}

impl From<ProtectionStore> for Vec<ProtectedRule> {
    fn from(store: ProtectionStore) -> Self {
        store.rules
    }
}
