//! Liveness and status handlers, nested under `/_status`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use common::snapshot::SnapshotSummary;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/version", get(version))
        .route("/snapshot", get(snapshot_summary))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "version": common::version::build_info() }))
}

async fn snapshot_summary(State(state): State<ServiceState>) -> Json<SnapshotSummary> {
    Json(state.snapshot().summary())
}
