use axum::routing::{get, post};
use axum::Router;

use crate::ServiceState;

pub mod overrides;
pub mod protections;
pub mod snapshot;

// Re-export for convenience
pub use overrides::SetOverrideRequest;
pub use protections::SetProtectionRequest;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/overrides", get(overrides::list).post(overrides::set))
        .route("/overrides/clear", post(overrides::clear))
        .route("/protections", get(protections::list).post(protections::set))
        .route("/protections/clear", post(protections::clear))
        .route("/snapshot", get(snapshot::summary))
        .route("/snapshot/reload", post(snapshot::reload))
        .with_state(state)
}
