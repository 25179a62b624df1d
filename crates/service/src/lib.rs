//! Shared service infrastructure for the Waypost gateway.
//!
//! This crate provides the components the gateway binary assembles:
//! - Config (snapshot directory, listen address, auth settings)
//! - State management (atomic snapshot handle + upstream client)
//! - HTTP surface (edge interceptor, login, sitemap, admin API, health)
//! - Upstream write-path client trait with an in-memory implementation

pub mod config;
pub mod http;
pub mod state;
pub mod upstream;

// Re-export key types for convenience
pub use config::Config;
pub use state::{State as ServiceState, StateSetupError};
pub use upstream::{MemoryUpstream, UpstreamError, UpstreamStore};
