//! The login surface.
//!
//! Authentication challenges redirect here with `next` (destination), `rid`
//! (matched rule id) and an optional `error` flag; a bare 401 body is never
//! served, so visitors always get a re-entry path. A successful password
//! submit sets the per-rule session artifact and bounces back to `next`.

use askama::Template;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use uuid::Uuid;

use common::auth::{session_cookie_name, CredentialToken, SESSION_TTL};
use common::snapshot::{AuthMode, ProtectedRule};

use crate::ServiceState;

/// Login URL with the challenge query parameters attached.
pub fn login_redirect(login_path: &str, next: &str, rule_id: &Uuid, error: bool) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("next", next);
    query.append_pair("rid", &rule_id.to_string());
    if error {
        query.append_pair("error", "1");
    }
    format!("{login_path}?{}", query.finish())
}

/// Only local destinations are bounced to after login.
fn sanitize_next(next: Option<&str>) -> String {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") => n.to_string(),
        _ => "/".to_string(),
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub next: String,
    pub rid: String,
    pub error: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub rid: Option<Uuid>,
    pub error: Option<String>,
}

pub async fn page(Query(query): Query<LoginQuery>) -> askama_axum::Response {
    let template = LoginTemplate {
        next: sanitize_next(query.next.as_deref()),
        rid: query.rid.map(|id| id.to_string()).unwrap_or_default(),
        error: query.error.is_some(),
    };
    template.into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub rid: Uuid,
    pub next: Option<String>,
    pub password: String,
}

pub async fn submit(
    State(state): State<ServiceState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, LoginError> {
    let snapshot = state.snapshot();
    let next = sanitize_next(form.next.as_deref());

    let rule = snapshot
        .protections
        .rule(&form.rid)
        .ok_or(LoginError::UnknownRule(form.rid))?;
    if rule.auth_mode != AuthMode::Password {
        return Err(LoginError::PasswordNotAccepted);
    }
    let credential = rule
        .credential
        .as_ref()
        .ok_or(LoginError::MissingCredential(form.rid))?;

    if !credential.verify(&form.password) {
        tracing::info!(rule = %form.rid, "password attempt rejected");
        return Ok(Redirect::temporary(&login_redirect(
            state.login_path(),
            &next,
            &form.rid,
            true,
        ))
        .into_response());
    }

    tracing::info!(rule = %form.rid, "session artifact issued");
    let jar = jar.add(session_cookie(rule, credential, state.cookie_secure()));
    Ok((jar, Redirect::temporary(&next)).into_response())
}

fn session_cookie(
    rule: &ProtectedRule,
    credential: &CredentialToken,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((session_cookie_name(&rule.id), credential.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(SESSION_TTL)
        .build()
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("unknown protection rule: {0}")]
    UnknownRule(Uuid),
    #[error("this rule does not accept passwords")]
    PasswordNotAccepted,
    #[error("protection rule {0} has no credential material")]
    MissingCredential(Uuid),
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        match self {
            LoginError::UnknownRule(_) => (
                http::StatusCode::NOT_FOUND,
                "Unknown protection rule".to_string(),
            )
                .into_response(),
            LoginError::PasswordNotAccepted => (
                http::StatusCode::BAD_REQUEST,
                "This rule does not accept passwords".to_string(),
            )
                .into_response(),
            LoginError::MissingCredential(_) => (
                http::StatusCode::INTERNAL_SERVER_ERROR,
                "Unexpected error".to_string(),
            )
                .into_response(),
        }
    }
}
