//! Administrator route overrides.
//!
//! An override maps a content id to a custom canonical path, superseding the
//! hierarchy-derived route at the next build. The store here is the read-side
//! mirror used for conflict detection on the write path; the rebuild remains
//! authoritative for uniqueness.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::manifest::RouteManifest;
use crate::id::PageId;

fn default_true() -> bool {
    true
}

/// A single administrator-assigned route override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOverride {
    pub page_id: PageId,
    pub route_path: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A competing owner reported when an override write targets a path that an
/// enabled override already resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideConflict {
    pub page_id: PageId,
    pub title: String,
}

/// Read-side mirror of the override table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<RouteOverride>", into = "Vec<RouteOverride>")]
pub struct OverrideStore {
    entries: Vec<RouteOverride>,
    by_page: BTreeMap<PageId, usize>,
}

impl OverrideStore {
    pub fn new(entries: Vec<RouteOverride>) -> Self {
        let mut by_page = BTreeMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_page.entry(entry.page_id).or_insert(idx);
        }
        Self { entries, by_page }
    }

    pub fn get(&self, page_id: &PageId) -> Option<&RouteOverride> {
        self.by_page.get(page_id).map(|idx| &self.entries[*idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteOverride> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enabled overrides currently resolving to `path`.
    pub fn owners_of<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a RouteOverride> {
        self.entries
            .iter()
            .filter(move |o| o.enabled && o.route_path == path)
    }

    /// Write-time conflict check for `set_override(page_id, route_path)`.
    ///
    /// Reports every *other* enabled override resolving to the same path,
    /// with titles pulled from the manifest where available. An empty result
    /// means the write may proceed; a non-empty result is surfaced to the
    /// caller, never silently resolved.
    pub fn conflicts(
        &self,
        page_id: &PageId,
        route_path: &str,
        manifest: &RouteManifest,
    ) -> Vec<OverrideConflict> {
        self.owners_of(route_path)
            .filter(|o| o.page_id != *page_id)
            .map(|o| OverrideConflict {
                page_id: o.page_id,
                title: manifest
                    .node(&o.page_id)
                    .map(|n| n.title.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

impl From<Vec<RouteOverride>> for OverrideStore {
    fn from(entries: Vec<RouteOverride>) -> Self {
        Self::new(entries)
    }
}

impl From<OverrideStore> for Vec<RouteOverride> {
    fn from(store: OverrideStore) -> Self {
        store.entries
    }
}
