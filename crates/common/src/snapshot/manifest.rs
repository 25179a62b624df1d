//! Route manifest: the immutable record of every known content node.
//!
//! The ingestion pipeline rebuilds the manifest as a whole-snapshot artifact;
//! each record carries the node's *currently assigned* canonical route, which
//! already reflects any overrides as of the last build. The manifest never
//! mutates in place, so lookups need no locking.
//!
//! Parent pointers come from upstream data and are not trusted to be
//! well-formed: every ancestor walk is bounded by [`MAX_PARENT_HOPS`] and
//! detects cycles instead of assuming acyclicity.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::id::PageId;

/// Upper bound on parent-chain traversal. Exceeding it means the manifest is
/// malformed; callers treat the walk as inconclusive, never as a fault.
pub const MAX_PARENT_HOPS: usize = 200;

/// What kind of content a manifest record describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A regular content page.
    Page,
    /// A collection/listing node.
    Database,
    /// Anything else the upstream service may emit.
    #[default]
    #[serde(other)]
    Other,
}

impl NodeKind {
    /// Fixed ranking used when two manifest entries collapse to the same
    /// canonical path: pages beat databases beat everything else.
    pub fn rank(&self) -> u8 {
        match self {
            NodeKind::Page => 2,
            NodeKind::Database => 1,
            NodeKind::Other => 0,
        }
    }
}

/// One node of the published content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentNode {
    pub id: PageId,
    #[serde(default)]
    pub title: String,
    /// Canonical route as of the last build, overrides already applied.
    pub route_path: String,
    /// Absent for roots.
    #[serde(default)]
    pub parent_id: Option<PageId>,
    #[serde(default)]
    pub kind: NodeKind,
}

/// Immutable snapshot of all known content nodes with path and id indexes.
///
/// Serialized form is the plain ordered record list produced by the
/// ingestion pipeline; indexes are rebuilt on deserialization. When two
/// records claim the same route path, the first one keeps the index slot --
/// sitemap scoring handles duplicate-path selection explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ContentNode>", into = "Vec<ContentNode>")]
pub struct RouteManifest {
    nodes: Vec<ContentNode>,
    by_path: BTreeMap<String, usize>,
    by_id: BTreeMap<PageId, usize>,
}

impl RouteManifest {
    pub fn new(nodes: Vec<ContentNode>) -> Self {
        let mut by_path = BTreeMap::new();
        let mut by_id = BTreeMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            by_path.entry(node.route_path.clone()).or_insert(idx);
            by_id.entry(node.id).or_insert(idx);
        }
        Self {
            nodes,
            by_path,
            by_id,
        }
    }

    pub fn node(&self, id: &PageId) -> Option<&ContentNode> {
        self.by_id.get(id).map(|idx| &self.nodes[*idx])
    }

    pub fn node_by_path(&self, path: &str) -> Option<&ContentNode> {
        self.by_path.get(path).map(|idx| &self.nodes[*idx])
    }

    /// Iterate records in artifact order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk from `id` toward the root, yielding the node itself first.
    ///
    /// The walk ends cleanly at a node without a parent (or whose parent is
    /// unknown). A cycle or a chain longer than [`MAX_PARENT_HOPS`] stops the
    /// iterator and marks it [`Ancestors::truncated`] so callers can treat
    /// the result as inconclusive.
    pub fn ancestors(&self, id: PageId) -> Ancestors<'_> {
        Ancestors {
            manifest: self,
            next: Some(id),
            seen: HashSet::new(),
            hops: 0,
            truncated: false,
        }
    }
}

impl From<Vec<ContentNode>> for RouteManifest {
    fn from(nodes: Vec<ContentNode>) -> Self {
        Self::new(nodes)
    }
}

impl From<RouteManifest> for Vec<ContentNode> {
    fn from(manifest: RouteManifest) -> Self {
        manifest.nodes
    }
}

/// Guarded parent-chain iterator, see [`RouteManifest::ancestors`].
pub struct Ancestors<'a> {
    manifest: &'a RouteManifest,
    next: Option<PageId>,
    seen: HashSet<PageId>,
    hops: usize,
    truncated: bool,
}

impl<'a> Ancestors<'a> {
    /// True once the walk was cut short by the hop bound or a cycle.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ContentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        if self.hops >= MAX_PARENT_HOPS || !self.seen.insert(id) {
            self.truncated = true;
            return None;
        }
        self.hops += 1;
        let node = self.manifest.node(&id)?;
        self.next = node.parent_id;
        Some(node)
    }
}
