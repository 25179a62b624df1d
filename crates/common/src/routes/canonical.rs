//! Path canonicalization.
//!
//! Every incoming path is normalized to its single canonical form before any
//! lookup happens: trailing slashes are stripped, legacy alias prefixes are
//! folded into their modern siblings, and bare content-id paths resolve to a
//! permanent redirect at the node's current route. Canonicalization is
//! idempotent: re-running it on its own output is a no-op.

use crate::id::PageId;
use crate::snapshot::RouteManifest;

/// Which HTTP redirect class a canonicalization decision maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    Permanent,
    Temporary,
}

/// Result of canonicalizing one raw request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canonical {
    /// The canonical form of the input (possibly the input itself).
    Path(String),
    /// The input must be answered with a redirect instead of served.
    Redirect { kind: RedirectKind, target: String },
}

impl Canonical {
    /// The canonical path this decision lands on, redirect target included.
    pub fn path(&self) -> &str {
        match self {
            Canonical::Path(p) => p,
            Canonical::Redirect { target, .. } => target,
        }
    }
}

/// Legacy alias prefixes and the modern prefixes they fold into.
///
/// Shared by the canonicalizer (legacy -> modern rewriting) and the resolver
/// (modern -> legacy sibling fallback when a manifest still keys entries
/// under the old prefix).
#[derive(Debug, Clone)]
pub struct LegacyAliases {
    pairs: Vec<(String, String)>,
}

impl Default for LegacyAliases {
    fn default() -> Self {
        Self::new(vec![
            // The retired list-style blog prefix; its index folds into the
            // blog root itself.
            ("/blog/list".to_string(), "/blog".to_string()),
            ("/posts".to_string(), "/blog".to_string()),
        ])
    }
}

impl LegacyAliases {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Fold a legacy-prefixed path into its modern form. First matching
    /// pair wins; `None` means the path carries no legacy prefix.
    pub fn rewrite(&self, path: &str) -> Option<String> {
        self.pairs
            .iter()
            .find_map(|(legacy, modern)| replace_prefix(path, legacy, modern))
    }

    /// The legacy spellings a canonical path may still be keyed under.
    pub fn legacy_forms(&self, path: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter_map(|(legacy, modern)| replace_prefix(path, modern, legacy))
            .collect()
    }
}

fn replace_prefix(path: &str, from: &str, to: &str) -> Option<String> {
    if path == from {
        return Some(to.to_string());
    }
    let rest = path.strip_prefix(from)?;
    if !rest.starts_with('/') {
        return None;
    }
    if to == "/" {
        Some(rest.to_string())
    } else {
        Some(format!("{to}{rest}"))
    }
}

/// Normalizes raw request paths into canonical routes. Pure; borrows one
/// snapshot's manifest for bare-id resolution.
pub struct PathCanonicalizer<'a> {
    manifest: &'a RouteManifest,
    aliases: &'a LegacyAliases,
}

impl<'a> PathCanonicalizer<'a> {
    pub fn new(manifest: &'a RouteManifest, aliases: &'a LegacyAliases) -> Self {
        Self { manifest, aliases }
    }

    /// Canonicalize one raw path. Steps run in order, first match wins:
    /// trailing-slash strip, legacy-alias rewrite, bare content-id lookup.
    /// An unknown bare id falls through unresolved; whether that becomes a
    /// 404 is a downstream decision.
    pub fn canonicalize(&self, raw: &str) -> Canonical {
        let path = normalize(raw);

        if let Some(rewritten) = self.aliases.rewrite(&path) {
            return Canonical::Path(rewritten);
        }

        if let Some(id) = parse_bare_id_path(&path) {
            if let Some(node) = self.manifest.node(&id) {
                if node.route_path != path {
                    return Canonical::Redirect {
                        kind: RedirectKind::Permanent,
                        target: node.route_path.clone(),
                    };
                }
            }
        }

        Canonical::Path(path)
    }
}

fn normalize(raw: &str) -> String {
    let mut path = if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    };
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

fn parse_bare_id_path(path: &str) -> Option<PageId> {
    let tail = path.strip_prefix('/')?;
    if tail.contains('/') {
        return None;
    }
    PageId::parse_bare(tail).ok()
}
