//! Route override writes.
//!
//! The conflict check here is advisory for the admin UI; the content rebuild
//! remains authoritative for uniqueness. Conflicts are reported with the
//! competing owners, never silently resolved by last-write-wins.

use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use common::id::PageId;
use common::snapshot::{OverrideConflict, RouteOverride};

use crate::upstream::UpstreamError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOverrideRequest {
    /// Page the override applies to
    pub page_id: PageId,
    /// New canonical path; empty or absent clears the override
    #[serde(default)]
    pub route_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOverrideResponse {
    pub page_id: PageId,
    pub route_path: Option<String>,
}

pub async fn set(
    State(state): State<ServiceState>,
    Json(req): Json<SetOverrideRequest>,
) -> Result<impl IntoResponse, OverrideError> {
    if !state.admin_enabled() {
        return Err(OverrideError::AdminDisabled);
    }

    let route_path = req.route_path.filter(|p| !p.is_empty());

    if let Some(path) = &route_path {
        if !path.starts_with('/') || (path.len() > 1 && path.ends_with('/')) {
            return Err(OverrideError::InvalidPath(path.clone()));
        }
        let snapshot = state.snapshot();
        let conflicts = snapshot
            .overrides
            .conflicts(&req.page_id, path, &snapshot.manifest);
        if !conflicts.is_empty() {
            return Err(OverrideError::Conflict(conflicts));
        }
    }

    state
        .upstream()
        .set_override(req.page_id, route_path.clone())
        .await?;

    tracing::info!(page = %req.page_id, path = ?route_path, "override write accepted");

    Ok((
        http::StatusCode::OK,
        Json(SetOverrideResponse {
            page_id: req.page_id,
            route_path,
        }),
    )
        .into_response())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearOverrideRequest {
    pub page_id: PageId,
}

pub async fn clear(
    State(state): State<ServiceState>,
    Json(req): Json<ClearOverrideRequest>,
) -> Result<impl IntoResponse, OverrideError> {
    if !state.admin_enabled() {
        return Err(OverrideError::AdminDisabled);
    }

    state.upstream().set_override(req.page_id, None).await?;
    tracing::info!(page = %req.page_id, "override cleared");

    Ok((
        http::StatusCode::OK,
        Json(SetOverrideResponse {
            page_id: req.page_id,
            route_path: None,
        }),
    )
        .into_response())
}

pub async fn list(State(state): State<ServiceState>) -> Json<Vec<RouteOverride>> {
    Json(state.snapshot().overrides.iter().cloned().collect())
}

#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error("administrative writes are disabled on this gateway")]
    AdminDisabled,
    #[error("invalid route path: {0}")]
    InvalidPath(String),
    #[error("route path already owned by {} other page(s)", .0.len())]
    Conflict(Vec<OverrideConflict>),
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for OverrideError {
    fn into_response(self) -> Response {
        match self {
            OverrideError::AdminDisabled => (
                http::StatusCode::FORBIDDEN,
                "Administrative writes are disabled".to_string(),
            )
                .into_response(),
            OverrideError::InvalidPath(msg) => (
                http::StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid route path: {}", msg),
            )
                .into_response(),
            OverrideError::Conflict(conflicts) => (
                http::StatusCode::CONFLICT,
                Json(serde_json::json!({
                    "error": "route path already in use",
                    "conflicts": conflicts,
                })),
            )
                .into_response(),
            OverrideError::Upstream(_) => (
                http::StatusCode::BAD_GATEWAY,
                "Upstream content service unavailable".to_string(),
            )
                .into_response(),
        }
    }
}
