//! Public-route enumeration for the sitemap page and the search-index feed.
//!
//! The builder scans every manifest route, drops what must not be listed
//! (protected subtrees, curated exclusions, per-section depth limits),
//! dedupes by canonical path with a fixed rubric, links each survivor to its
//! nearest surviving ancestor, and emits rows depth-first with lexicographic
//! siblings, root first. Ordering is fully deterministic for a given
//! snapshot.
//!
//! `parent_route_path` is `None` only on the root row itself; any survivor
//! whose ancestors were all dropped links to `/`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::PageId;
use crate::routes::{
    path_is_within, AccessResolver, Canonical, LegacyAliases, PathCanonicalizer,
};
use crate::snapshot::{ContentNode, RouteManifest, Snapshot};

/// Cap on listing depth inside one section of the tree, e.g. "no blog
/// entries past depth 2".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDepthLimit {
    pub prefix: String,
    pub max_depth: usize,
}

/// What never gets listed publicly, beyond protection rules.
///
/// One policy value serves every enumeration consumer; the search-index
/// builder filters with this same value rather than keeping its own copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExclusionPolicy {
    /// Curated path prefixes; each excludes its whole subtree.
    pub path_prefixes: Vec<String>,
    /// Curated content ids; each excludes the content subtree below it.
    pub page_subtrees: Vec<PageId>,
    /// Automatic per-section depth caps.
    pub section_depth_limits: Vec<SectionDepthLimit>,
}

impl ExclusionPolicy {
    pub fn excludes(&self, manifest: &RouteManifest, node: &ContentNode, canonical: &str) -> bool {
        if self
            .path_prefixes
            .iter()
            .any(|prefix| path_is_within(canonical, prefix))
        {
            return true;
        }

        if !self.page_subtrees.is_empty()
            && manifest
                .ancestors(node.id)
                .any(|ancestor| self.page_subtrees.contains(&ancestor.id))
        {
            return true;
        }

        self.section_depth_limits.iter().any(|limit| {
            path_is_within(canonical, &limit.prefix)
                && depth_below(canonical, &limit.prefix) > limit.max_depth
        })
    }
}

fn segment_count(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

fn depth_below(path: &str, prefix: &str) -> usize {
    segment_count(path).saturating_sub(segment_count(prefix))
}

/// One publicly listable route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapRow {
    pub route_path: String,
    pub title: String,
    pub parent_route_path: Option<String>,
    pub depth: usize,
}

/// Build the ordered, deduplicated public route list for one snapshot.
pub fn build(snapshot: &Snapshot, aliases: &LegacyAliases) -> Vec<SitemapRow> {
    let canonicalizer = PathCanonicalizer::new(&snapshot.manifest, aliases);
    let resolver = AccessResolver::new(snapshot, aliases);

    let canonical_of = |route_path: &str| -> String {
        match canonicalizer.canonicalize(route_path) {
            Canonical::Path(p) => p,
            Canonical::Redirect { target, .. } => target,
        }
    };

    // Survivor selection, deduped by canonical path. Manifest order breaks
    // rubric ties: the first record keeps the slot.
    let mut survivors: BTreeMap<String, &ContentNode> = BTreeMap::new();
    for node in snapshot.manifest.iter() {
        let canonical = canonical_of(&node.route_path);
        if resolver.resolve(&canonical).rule.is_some() {
            continue;
        }
        if snapshot.exclusions.excludes(&snapshot.manifest, node, &canonical) {
            continue;
        }
        let replace = match survivors.get(&canonical) {
            Some(current) => score(node, &canonical) > score(current, &canonical),
            None => true,
        };
        if replace {
            survivors.insert(canonical, node);
        }
    }

    // Parent linking: nearest manifest ancestor that itself survived.
    let mut parents: BTreeMap<&str, String> = BTreeMap::new();
    let mut children: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (canonical, node) in &survivors {
        if canonical == "/" {
            continue;
        }
        let mut parent = "/".to_string();
        for ancestor in snapshot.manifest.ancestors(node.id).skip(1) {
            let ancestor_path = canonical_of(&ancestor.route_path);
            if ancestor_path != *canonical && survivors.contains_key(&ancestor_path) {
                parent = ancestor_path;
                break;
            }
        }
        children.entry(parent.clone()).or_default().push(canonical.as_str());
        parents.insert(canonical.as_str(), parent);
    }
    for siblings in children.values_mut() {
        siblings.sort_unstable();
    }

    // Depth-first emission, root first.
    let mut rows = Vec::with_capacity(survivors.len());
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut stack: Vec<(&str, usize)> = Vec::new();

    if survivors.contains_key("/") {
        stack.push(("/", 0));
    } else if let Some(top) = children.get("/") {
        for path in top.iter().rev() {
            stack.push((*path, 0));
        }
    }

    while let Some((path, depth)) = stack.pop() {
        if !seen.insert(path) {
            continue;
        }
        if let Some(node) = survivors.get(path) {
            rows.push(SitemapRow {
                route_path: path.to_string(),
                title: node.title.clone(),
                parent_route_path: if path == "/" {
                    None
                } else {
                    Some(parents.get(path).cloned().unwrap_or_else(|| "/".to_string()))
                },
                depth,
            });
        }
        if let Some(kids) = children.get(path) {
            for child in kids.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
    }

    // Survivors stranded by malformed parent links (mutual cycles) still
    // list, at the root level.
    for (path, node) in &survivors {
        if seen.contains(path.as_str()) {
            continue;
        }
        rows.push(SitemapRow {
            route_path: path.clone(),
            title: node.title.clone(),
            parent_route_path: Some("/".to_string()),
            depth: 0,
        });
    }

    rows
}

/// Dedup rubric for manifest entries collapsing to one canonical path.
fn score(node: &ContentNode, canonical: &str) -> (u8, bool, bool) {
    (
        node.kind.rank(),
        node.route_path == canonical,
        !node.title.is_empty(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{
        AuthMode, MatchMode, NodeKind, ProtectedRule, ProtectionStore, RouteManifest,
    };
    use uuid::Uuid;

    fn pid(n: u128) -> PageId {
        PageId::from(Uuid::from_u128(n))
    }

    fn node(id: u128, title: &str, path: &str, parent: Option<u128>, kind: NodeKind) -> ContentNode {
        ContentNode {
            id: pid(id),
            title: title.to_string(),
            route_path: path.to_string(),
            parent_id: parent.map(pid),
            kind,
        }
    }

    fn site_manifest() -> RouteManifest {
        RouteManifest::new(vec![
            node(1, "Home", "/", None, NodeKind::Page),
            node(2, "Blog", "/blog", Some(1), NodeKind::Page),
            node(3, "First post", "/blog/a-post", Some(2), NodeKind::Page),
            node(4, "About", "/about", Some(1), NodeKind::Page),
            node(5, "Contact", "/contact", Some(1), NodeKind::Page),
        ])
    }

    fn rows_for(snapshot: &Snapshot) -> Vec<SitemapRow> {
        let aliases = LegacyAliases::default();
        build(snapshot, &aliases)
    }

    #[test]
    fn test_depth_first_lexicographic_root_first() {
        let snapshot = Snapshot {
            manifest: site_manifest(),
            ..Default::default()
        };
        let rows = rows_for(&snapshot);
        let paths: Vec<&str> = rows.iter().map(|r| r.route_path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/about", "/blog", "/blog/a-post", "/contact"]);

        assert_eq!(rows[0].depth, 0);
        assert_eq!(rows[0].parent_route_path, None);
        assert_eq!(rows[2].depth, 1);
        assert_eq!(rows[3].depth, 2);
        assert_eq!(rows[3].parent_route_path.as_deref(), Some("/blog"));
    }

    #[test]
    fn test_protected_subtree_not_listed() {
        let snapshot = Snapshot {
            manifest: site_manifest(),
            protections: ProtectionStore::new(vec![ProtectedRule {
                id: Uuid::from_u128(10),
                page_id: Some(pid(2)),
                path: "/blog".to_string(),
                match_mode: MatchMode::Prefix,
                auth_mode: AuthMode::Password,
                credential: None,
                enabled: true,
            }]),
            ..Default::default()
        };
        let rows = rows_for(&snapshot);
        let paths: Vec<&str> = rows.iter().map(|r| r.route_path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/about", "/contact"]);
    }

    #[test]
    fn test_curated_prefix_excludes_subtree() {
        let snapshot = Snapshot {
            manifest: site_manifest(),
            exclusions: ExclusionPolicy {
                path_prefixes: vec!["/blog".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let paths: Vec<String> = rows_for(&snapshot).into_iter().map(|r| r.route_path).collect();
        assert_eq!(paths, vec!["/", "/about", "/contact"]);
    }

    #[test]
    fn test_page_subtree_exclusion_covers_descendants() {
        let snapshot = Snapshot {
            manifest: site_manifest(),
            exclusions: ExclusionPolicy {
                page_subtrees: vec![pid(2)],
                ..Default::default()
            },
            ..Default::default()
        };
        let paths: Vec<String> = rows_for(&snapshot).into_iter().map(|r| r.route_path).collect();
        assert_eq!(paths, vec!["/", "/about", "/contact"]);
    }

    #[test]
    fn test_section_depth_limit() {
        let snapshot = Snapshot {
            manifest: RouteManifest::new(vec![
                node(1, "Home", "/", None, NodeKind::Page),
                node(2, "Blog", "/blog", Some(1), NodeKind::Page),
                node(3, "Post", "/blog/post", Some(2), NodeKind::Page),
                node(4, "Appendix", "/blog/post/appendix", Some(3), NodeKind::Page),
            ]),
            exclusions: ExclusionPolicy {
                section_depth_limits: vec![SectionDepthLimit {
                    prefix: "/blog".to_string(),
                    max_depth: 1,
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        let paths: Vec<String> = rows_for(&snapshot).into_iter().map(|r| r.route_path).collect();
        assert_eq!(paths, vec!["/", "/blog", "/blog/post"]);
    }

    #[test]
    fn test_duplicate_canonical_scored_by_rubric() {
        // A database node and a page node share a route; the page wins.
        let snapshot = Snapshot {
            manifest: RouteManifest::new(vec![
                node(1, "Listing", "/docs", None, NodeKind::Database),
                node(2, "Docs", "/docs", None, NodeKind::Page),
            ]),
            ..Default::default()
        };
        let rows = rows_for(&snapshot);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Docs");
    }

    #[test]
    fn test_duplicate_canonical_tie_keeps_first_record() {
        let snapshot = Snapshot {
            manifest: RouteManifest::new(vec![
                node(1, "First", "/dup", None, NodeKind::Page),
                node(2, "Second", "/dup", None, NodeKind::Page),
            ]),
            ..Default::default()
        };
        let rows = rows_for(&snapshot);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "First");
    }

    #[test]
    fn test_orphan_links_to_root() {
        // Parent id 99 is not in the manifest; the survivor still lists,
        // parented at the root.
        let snapshot = Snapshot {
            manifest: RouteManifest::new(vec![
                node(1, "Home", "/", None, NodeKind::Page),
                node(3, "Stray", "/stray", Some(99), NodeKind::Page),
            ]),
            ..Default::default()
        };
        let rows = rows_for(&snapshot);
        let stray = rows.iter().find(|r| r.route_path == "/stray").unwrap();
        assert_eq!(stray.parent_route_path.as_deref(), Some("/"));
        assert_eq!(stray.depth, 1);
    }

    #[test]
    fn test_without_root_row_top_level_starts_at_depth_zero() {
        let snapshot = Snapshot {
            manifest: RouteManifest::new(vec![
                node(2, "Blog", "/blog", None, NodeKind::Page),
                node(3, "Post", "/blog/post", Some(2), NodeKind::Page),
            ]),
            ..Default::default()
        };
        let rows = rows_for(&snapshot);
        let paths: Vec<&str> = rows.iter().map(|r| r.route_path.as_str()).collect();
        assert_eq!(paths, vec!["/blog", "/blog/post"]);
        assert_eq!(rows[0].depth, 0);
        assert_eq!(rows[0].parent_route_path.as_deref(), Some("/"));
        assert_eq!(rows[1].depth, 1);
    }

    #[test]
    fn test_mutual_parent_cycle_still_lists() {
        // a and b claim each other as parent; neither reaches the root, but
        // both still appear, parented at the root level.
        let snapshot = Snapshot {
            manifest: RouteManifest::new(vec![
                node(1, "Home", "/", None, NodeKind::Page),
                node(2, "A", "/a", Some(3), NodeKind::Page),
                node(3, "B", "/b", Some(2), NodeKind::Page),
            ]),
            ..Default::default()
        };
        let rows = rows_for(&snapshot);
        let paths: Vec<&str> = rows.iter().map(|r| r.route_path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/a", "/b"]);
        assert_eq!(rows[1].parent_route_path.as_deref(), Some("/"));
    }

    #[test]
    fn test_rows_serialize_camel_case() {
        let row = SitemapRow {
            route_path: "/blog".to_string(),
            title: "Blog".to_string(),
            parent_route_path: Some("/".to_string()),
            depth: 1,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("routePath").is_some());
        assert!(json.get("parentRoutePath").is_some());
    }

    #[test]
    fn test_depth_below_counts_segments() {
        assert_eq!(depth_below("/blog/a/b", "/blog"), 2);
        assert_eq!(depth_below("/blog", "/blog"), 0);
        assert_eq!(depth_below("/a", "/"), 1);
    }
}
