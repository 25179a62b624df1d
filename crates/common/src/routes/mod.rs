//! Route canonicalization and access resolution.

pub mod canonical;
pub mod resolve;

pub use canonical::{Canonical, LegacyAliases, PathCanonicalizer, RedirectKind};
pub use resolve::{path_is_within, AccessResolver, Resolution};
