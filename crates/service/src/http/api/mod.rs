//! Admin write API, consumed by the admin-UI collaborator.

pub mod v0;

use axum::Router;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new().nest("/v0", v0::router(state))
}
