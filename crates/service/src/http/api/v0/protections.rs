//! Protection rule writes.
//!
//! Unknown auth modes are rejected here, at write time; the read path
//! decodes them as `password` instead (fail toward requiring a credential).
//! Passwords are salted and hashed before anything leaves this process, and
//! the list endpoint never echoes credential material back.

use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::auth::{CredentialError, CredentialToken};
use common::id::PageId;
use common::snapshot::{AuthMode, MatchMode, ProtectedRule, UnknownAuthMode};

use crate::upstream::UpstreamError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProtectionRequest {
    /// Page to key the rule on; rules may instead key on `path` alone
    #[serde(default)]
    pub page_id: Option<PageId>,
    pub path: String,
    pub match_mode: MatchMode,
    /// Parsed strictly; unknown modes are rejected
    pub auth_mode: String,
    /// Required for password rules, ignored otherwise
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProtectionResponse {
    pub id: Uuid,
}

pub async fn set(
    State(state): State<ServiceState>,
    Json(req): Json<SetProtectionRequest>,
) -> Result<impl IntoResponse, ProtectionError> {
    if !state.admin_enabled() {
        return Err(ProtectionError::AdminDisabled);
    }
    if !req.path.starts_with('/') {
        return Err(ProtectionError::InvalidPath(req.path));
    }

    let auth_mode: AuthMode = req.auth_mode.parse()?;
    let credential = match auth_mode {
        AuthMode::Password => {
            let password = req
                .password
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or(ProtectionError::PasswordRequired)?;
            Some(CredentialToken::derive(password)?)
        }
        AuthMode::FederatedIdentity => None,
    };

    let rule = ProtectedRule {
        id: Uuid::new_v4(),
        page_id: req.page_id,
        path: req.path,
        match_mode: req.match_mode,
        auth_mode,
        credential,
        enabled: true,
    };

    state.upstream().set_protection(rule.clone()).await?;
    tracing::info!(rule = %rule.id, page = ?rule.page_id, path = %rule.path, "protection write accepted");

    Ok((http::StatusCode::OK, Json(SetProtectionResponse { id: rule.id })).into_response())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearProtectionRequest {
    #[serde(default)]
    pub page_id: Option<PageId>,
    pub path: String,
}

pub async fn clear(
    State(state): State<ServiceState>,
    Json(req): Json<ClearProtectionRequest>,
) -> Result<impl IntoResponse, ProtectionError> {
    if !state.admin_enabled() {
        return Err(ProtectionError::AdminDisabled);
    }

    state
        .upstream()
        .clear_protection(req.page_id, &req.path)
        .await?;
    tracing::info!(page = ?req.page_id, path = %req.path, "protection cleared");

    Ok(http::StatusCode::OK)
}

/// Listing view of a rule, credential material withheld.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionSummary {
    pub id: Uuid,
    pub page_id: Option<PageId>,
    pub path: String,
    pub match_mode: MatchMode,
    pub auth_mode: AuthMode,
    pub enabled: bool,
}

pub async fn list(State(state): State<ServiceState>) -> Json<Vec<ProtectionSummary>> {
    let rules = state
        .snapshot()
        .protections
        .iter()
        .map(|rule| ProtectionSummary {
            id: rule.id,
            page_id: rule.page_id,
            path: rule.path.clone(),
            match_mode: rule.match_mode,
            auth_mode: rule.auth_mode,
            enabled: rule.enabled,
        })
        .collect();
    Json(rules)
}

#[derive(Debug, thiserror::Error)]
pub enum ProtectionError {
    #[error("administrative writes are disabled on this gateway")]
    AdminDisabled,
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    UnknownAuthMode(#[from] UnknownAuthMode),
    #[error("password rules require a password")]
    PasswordRequired,
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for ProtectionError {
    fn into_response(self) -> Response {
        match self {
            ProtectionError::AdminDisabled => (
                http::StatusCode::FORBIDDEN,
                "Administrative writes are disabled".to_string(),
            )
                .into_response(),
            ProtectionError::InvalidPath(msg) => (
                http::StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid path: {}", msg),
            )
                .into_response(),
            ProtectionError::UnknownAuthMode(err) => (
                http::StatusCode::UNPROCESSABLE_ENTITY,
                err.to_string(),
            )
                .into_response(),
            ProtectionError::PasswordRequired => (
                http::StatusCode::UNPROCESSABLE_ENTITY,
                "Password rules require a password".to_string(),
            )
                .into_response(),
            ProtectionError::Credential(_) | ProtectionError::Upstream(_) => (
                http::StatusCode::INTERNAL_SERVER_ERROR,
                "Unexpected error".to_string(),
            )
                .into_response(),
        }
    }
}
