//! HTTP handlers and routers for the gateway.

pub mod api;
pub mod edge;
pub mod health;
pub mod login;
pub mod sitemap;

use axum::routing::get;
use axum::Router;

use crate::ServiceState;

pub const API_PREFIX: &str = "/api";
pub const STATUS_PREFIX: &str = "/_status";

/// The full gateway router: named routes first, everything else falls
/// through to the edge interceptor.
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route(state.login_path(), get(login::page).post(login::submit))
        .route("/sitemap", get(sitemap::page))
        .route("/sitemap.json", get(sitemap::rows))
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .nest(API_PREFIX, api::router(state.clone()))
        .fallback(edge::handler)
        .with_state(state)
}
