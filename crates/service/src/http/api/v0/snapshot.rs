//! Snapshot status and reload.
//!
//! Reload re-reads the artifact directory and swaps the single snapshot
//! reference; in-flight requests keep the build they started with.

use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};

use common::snapshot::SnapshotSummary;

use crate::ServiceState;

pub async fn summary(State(state): State<ServiceState>) -> Json<SnapshotSummary> {
    Json(state.snapshot().summary())
}

pub async fn reload(
    State(state): State<ServiceState>,
) -> Result<Json<SnapshotSummary>, ReloadError> {
    if !state.admin_enabled() {
        return Err(ReloadError::AdminDisabled);
    }
    Ok(Json(state.reload_snapshot()))
}

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("administrative writes are disabled on this gateway")]
    AdminDisabled,
}

impl IntoResponse for ReloadError {
    fn into_response(self) -> Response {
        match self {
            ReloadError::AdminDisabled => (
                http::StatusCode::FORBIDDEN,
                "Administrative writes are disabled".to_string(),
            )
                .into_response(),
        }
    }
}
