/**
 * Credential hashing, constant-time verification,
 *  and federated identity token checks.
 */
pub mod auth;
/**
 * Canonical content identifiers: the stable ids
 *  assigned by the upstream content service,
 *  normalized to a bare hex form.
 */
pub mod id;
/**
 * Path canonicalization and access resolution.
 * Turns raw request paths into canonical routes and
 *  answers which content id and protection rule apply.
 */
pub mod routes;
/**
 * Build-time enumeration of publicly listable routes,
 *  shared by the sitemap page and the search-index feed.
 */
pub mod sitemap;
/**
 * The immutable per-process snapshot: route manifest,
 *  route overrides and protection rules, loaded once
 *  and swapped atomically on rebuild.
 */
pub mod snapshot;
/**
 * Helper for exposing build version information.
 */
pub mod version;

pub mod prelude {
    pub use crate::auth::CredentialToken;
    pub use crate::id::PageId;
    pub use crate::routes::{AccessResolver, Canonical, LegacyAliases, PathCanonicalizer};
    pub use crate::sitemap::{ExclusionPolicy, SitemapRow};
    pub use crate::snapshot::{RouteManifest, Snapshot};
    pub use crate::version::build_info;
}
