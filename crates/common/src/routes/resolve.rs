//! Access resolution: canonical path -> content id + effective protection.
//!
//! Protection uses two independent strategies, tried in order, first hit
//! wins. The page-hierarchy strategy is preferred because it survives later
//! route overrides: an id-keyed rule keeps protecting a subtree even after
//! an administrator moves a descendant's URL, where a path-keyed rule would
//! silently desynchronize. The path-prefix strategy applies only when no
//! content id resolves for the path (or when the hierarchy walk aborts on a
//! malformed parent chain).

use crate::id::PageId;
use crate::snapshot::{MatchMode, ProtectedRule, Snapshot};

use super::canonical::LegacyAliases;

/// Outcome of resolving one canonical path.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub page_id: Option<PageId>,
    pub rule: Option<&'a ProtectedRule>,
}

struct WalkAborted;

/// Pure resolver over one snapshot. No I/O, no locking; safe to call from
/// any number of request threads against the same snapshot.
pub struct AccessResolver<'a> {
    snapshot: &'a Snapshot,
    aliases: &'a LegacyAliases,
}

impl<'a> AccessResolver<'a> {
    pub fn new(snapshot: &'a Snapshot, aliases: &'a LegacyAliases) -> Self {
        Self { snapshot, aliases }
    }

    /// Canonical path -> content id. Tries the manifest directly, then the
    /// legacy sibling spellings the manifest may still be keyed under.
    pub fn lookup_id(&self, canonical: &str) -> Option<PageId> {
        if let Some(node) = self.snapshot.manifest.node_by_path(canonical) {
            return Some(node.id);
        }
        self.aliases
            .legacy_forms(canonical)
            .iter()
            .find_map(|form| self.snapshot.manifest.node_by_path(form))
            .map(|node| node.id)
    }

    pub fn resolve(&self, canonical: &str) -> Resolution<'a> {
        match self.lookup_id(canonical) {
            Some(id) => match self.hierarchy_rule(id) {
                Ok(rule) => Resolution {
                    page_id: Some(id),
                    rule,
                },
                // Malformed parent chain: fall back to path matching rather
                // than failing the request.
                Err(WalkAborted) => Resolution {
                    page_id: Some(id),
                    rule: self.prefix_rule(canonical),
                },
            },
            None => Resolution {
                page_id: None,
                rule: self.prefix_rule(canonical),
            },
        }
    }

    /// Nearest protecting ancestor, the node itself included.
    fn hierarchy_rule(&self, id: PageId) -> Result<Option<&'a ProtectedRule>, WalkAborted> {
        let mut walk = self.snapshot.manifest.ancestors(id);
        for node in walk.by_ref() {
            if let Some(rule) = self.snapshot.protections.rule_for_page(&node.id) {
                return Ok(Some(rule));
            }
        }
        if walk.truncated() {
            Err(WalkAborted)
        } else {
            Ok(None)
        }
    }

    /// Path-keyed matching. Exact-mode rules are checked first and
    /// short-circuit prefix evaluation; among prefix rules (universal root
    /// excluded) the longest matching path wins.
    fn prefix_rule(&self, canonical: &str) -> Option<&'a ProtectedRule> {
        let exact = self
            .snapshot
            .protections
            .path_rules()
            .filter(|r| r.match_mode == MatchMode::Exact)
            .filter(|r| path_is_within(canonical, &r.path))
            .max_by_key(|r| r.path.len());
        if exact.is_some() {
            return exact;
        }

        self.snapshot
            .protections
            .path_rules()
            .filter(|r| r.match_mode == MatchMode::Prefix)
            .filter(|r| r.path != "/")
            .filter(|r| path_is_within(canonical, &r.path))
            .max_by_key(|r| r.path.len())
    }
}

/// True when `path` equals `base` or lies in the subtree rooted at it.
pub fn path_is_within(path: &str, base: &str) -> bool {
    if base == "/" {
        return true;
    }
    path == base
        || (path.len() > base.len()
            && path.starts_with(base)
            && path.as_bytes()[base.len()] == b'/')
}
