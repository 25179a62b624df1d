//! The immutable resolution snapshot.
//!
//! The ingestion pipeline publishes each store as a whole-file JSON artifact;
//! a [`Snapshot`] is one atomic load of all of them. Resolution always runs
//! against a single snapshot value, so no request can observe one store's
//! old data mixed with another's new data. Rebuilds produce a fresh
//! `Snapshot` and the process swaps a single reference.
//!
//! A missing or malformed artifact degrades to that store's empty value with
//! a configuration warning: content delivery must not go dark because an
//! auxiliary data file is absent.

pub mod manifest;
pub mod overrides;
pub mod protection;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use manifest::{Ancestors, ContentNode, NodeKind, RouteManifest, MAX_PARENT_HOPS};
pub use overrides::{OverrideConflict, OverrideStore, RouteOverride};
pub use protection::{AuthMode, MatchMode, ProtectedRule, ProtectionStore, UnknownAuthMode};

use crate::sitemap::ExclusionPolicy;

pub const MANIFEST_ARTIFACT: &str = "manifest.json";
pub const OVERRIDES_ARTIFACT: &str = "overrides.json";
pub const PROTECTIONS_ARTIFACT: &str = "protections.json";
pub const EXCLUSIONS_ARTIFACT: &str = "exclusions.json";

/// One atomic, immutable load of manifest + overrides + protections, plus
/// the sitemap exclusion policy (carried here so the sitemap page and the
/// search-index feed share a single policy).
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub manifest: RouteManifest,
    pub overrides: OverrideStore,
    pub protections: ProtectionStore,
    pub exclusions: ExclusionPolicy,
}

impl Snapshot {
    /// Load all artifacts from `dir`. Infallible: each unreadable or
    /// malformed artifact is logged and replaced with its empty value.
    pub fn load(dir: &Path) -> Self {
        Self {
            manifest: load_artifact(dir, MANIFEST_ARTIFACT),
            overrides: load_artifact(dir, OVERRIDES_ARTIFACT),
            protections: load_artifact(dir, PROTECTIONS_ARTIFACT),
            exclusions: load_artifact(dir, EXCLUSIONS_ARTIFACT),
        }
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            nodes: self.manifest.len(),
            overrides: self.overrides.len(),
            protections: self.protections.len(),
        }
    }
}

/// Store counts for health/status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub nodes: usize,
    pub overrides: usize,
    pub protections: usize,
}

fn load_artifact<T: DeserializeOwned + Default>(dir: &Path, name: &str) -> T {
    let path = dir.join(name);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(
                artifact = name,
                %err,
                "snapshot artifact unreadable, treating store as empty"
            );
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(
                artifact = name,
                %err,
                "snapshot artifact malformed, treating store as empty"
            );
            T::default()
        }
    }
}
