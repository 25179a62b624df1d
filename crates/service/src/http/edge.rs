//! The per-request edge interceptor.
//!
//! Every request not claimed by a named route lands here. The decision logic
//! is a pure function over one snapshot plus the credentials the request
//! presents; the axum handler only translates the decision into a response.
//!
//! Pass-through responses carry the resolution result (canonical path and
//! content id) for the downstream renderer, which is an external
//! collaborator; unknown paths pass through unresolved and the renderer
//! decides the 404.

use axum::extract::State;
use axum::http::Uri;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use common::auth::federated::{AllowList, IdentityVerifier};
use common::auth::session_cookie_name;
use common::id::PageId;
use common::routes::{AccessResolver, Canonical, LegacyAliases, PathCanonicalizer, RedirectKind};
use common::snapshot::{AuthMode, ProtectedRule, Snapshot};

use crate::ServiceState;

use super::login::login_redirect;

/// Cookie (or `Authorization: Bearer`) carrying the federated identity token.
pub const IDENTITY_COOKIE: &str = "waypost_identity";

pub const CANONICAL_PATH_HEADER: &str = "x-waypost-canonical-path";
pub const PAGE_ID_HEADER: &str = "x-waypost-page-id";

/// What the interceptor decided for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeDecision {
    /// Serve the canonical path; `page_id` is `None` for unknown routes.
    Pass {
        canonical: String,
        page_id: Option<PageId>,
    },
    /// Answer with a redirect instead of serving.
    Redirect { kind: RedirectKind, target: String },
    /// Force an authentication challenge at the login surface.
    Challenge { rule_id: Uuid, next: String },
}

/// Credentials presented by a request.
pub trait CredentialSource {
    fn cookie(&self, name: &str) -> Option<String>;
    fn identity_token(&self) -> Option<String>;
}

struct RequestCredentials<'a> {
    jar: &'a CookieJar,
    headers: &'a HeaderMap,
}

impl CredentialSource for RequestCredentials<'_> {
    fn cookie(&self, name: &str) -> Option<String> {
        self.jar.get(name).map(|c| c.value().to_string())
    }

    fn identity_token(&self) -> Option<String> {
        if let Some(cookie) = self.jar.get(IDENTITY_COOKIE) {
            return Some(cookie.value().to_string());
        }
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(str::to_string)
    }
}

/// Pure decision function: canonicalize, resolve, authorize.
pub fn decide(
    snapshot: &Snapshot,
    aliases: &LegacyAliases,
    verifier: Option<&IdentityVerifier>,
    allow_list: &AllowList,
    raw_path: &str,
    creds: &impl CredentialSource,
    now: OffsetDateTime,
) -> EdgeDecision {
    let canonicalizer = PathCanonicalizer::new(&snapshot.manifest, aliases);
    let canonical = match canonicalizer.canonicalize(raw_path) {
        Canonical::Redirect { kind, target } => return EdgeDecision::Redirect { kind, target },
        Canonical::Path(path) => path,
    };
    if canonical != raw_path {
        return EdgeDecision::Redirect {
            kind: RedirectKind::Permanent,
            target: canonical,
        };
    }

    let resolver = AccessResolver::new(snapshot, aliases);
    let resolution = resolver.resolve(&canonical);
    if let Some(rule) = resolution.rule {
        if !authorized(rule, verifier, allow_list, creds, now) {
            return EdgeDecision::Challenge {
                rule_id: rule.id,
                next: canonical,
            };
        }
    }

    EdgeDecision::Pass {
        canonical,
        page_id: resolution.page_id,
    }
}

fn authorized(
    rule: &ProtectedRule,
    verifier: Option<&IdentityVerifier>,
    allow_list: &AllowList,
    creds: &impl CredentialSource,
    now: OffsetDateTime,
) -> bool {
    match rule.auth_mode {
        AuthMode::Password => {
            let Some(credential) = rule.credential.as_ref() else {
                // A password rule without material can never be satisfied.
                return false;
            };
            creds
                .cookie(&session_cookie_name(&rule.id))
                .map(|artifact| credential.matches_artifact(&artifact))
                .unwrap_or(false)
        }
        AuthMode::FederatedIdentity => {
            let (Some(verifier), Some(token)) = (verifier, creds.identity_token()) else {
                return false;
            };
            match verifier.verify(&token, now) {
                Ok(claims) => allow_list.contains(&claims.sub),
                Err(err) => {
                    tracing::debug!(rule = %rule.id, %err, "identity token rejected");
                    false
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PassBody {
    canonical_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_id: Option<PageId>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    jar: CookieJar,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let snapshot = state.snapshot();
    let creds = RequestCredentials {
        jar: &jar,
        headers: &headers,
    };
    let decision = decide(
        &snapshot,
        state.aliases(),
        state.identity_verifier(),
        state.allow_list(),
        uri.path(),
        &creds,
        OffsetDateTime::now_utc(),
    );

    match decision {
        EdgeDecision::Pass { canonical, page_id } => {
            tracing::debug!(path = %canonical, page = ?page_id, "pass-through");
            let mut response = Json(PassBody {
                canonical_path: canonical.clone(),
                page_id,
            })
            .into_response();
            if let Ok(value) = HeaderValue::from_str(&canonical) {
                response.headers_mut().insert(CANONICAL_PATH_HEADER, value);
            }
            if let Some(page_id) = page_id {
                if let Ok(value) = HeaderValue::from_str(&page_id.to_string()) {
                    response.headers_mut().insert(PAGE_ID_HEADER, value);
                }
            }
            response
        }
        EdgeDecision::Redirect { kind, target } => {
            let target = with_query(&target, uri.query());
            tracing::debug!(%target, ?kind, "redirect");
            match kind {
                RedirectKind::Permanent => Redirect::permanent(&target).into_response(),
                RedirectKind::Temporary => Redirect::temporary(&target).into_response(),
            }
        }
        EdgeDecision::Challenge { rule_id, next } => {
            let next = with_query(&next, uri.query());
            tracing::debug!(rule = %rule_id, %next, "authentication challenge");
            Redirect::temporary(&login_redirect(state.login_path(), &next, &rule_id, false))
                .into_response()
        }
    }
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::auth::CredentialToken;
    use common::snapshot::{
        ContentNode, MatchMode, NodeKind, ProtectionStore, RouteManifest,
    };
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct FakeCreds {
        cookies: BTreeMap<String, String>,
        identity: Option<String>,
    }

    impl CredentialSource for FakeCreds {
        fn cookie(&self, name: &str) -> Option<String> {
            self.cookies.get(name).cloned()
        }

        fn identity_token(&self) -> Option<String> {
            self.identity.clone()
        }
    }

    fn pid(n: u128) -> PageId {
        PageId::from(Uuid::from_u128(n))
    }

    fn node(id: u128, path: &str, parent: Option<u128>) -> ContentNode {
        ContentNode {
            id: pid(id),
            title: format!("node {id}"),
            route_path: path.to_string(),
            parent_id: parent.map(pid),
            kind: NodeKind::Page,
        }
    }

    fn password_rule(rule_id: u128, page: u128, password: &str) -> ProtectedRule {
        ProtectedRule {
            id: Uuid::from_u128(rule_id),
            page_id: Some(pid(page)),
            path: String::new(),
            match_mode: MatchMode::Prefix,
            auth_mode: AuthMode::Password,
            credential: Some(CredentialToken::derive_with_salt(&[1u8; 16], password)),
            enabled: true,
        }
    }

    fn site(rules: Vec<ProtectedRule>) -> Snapshot {
        Snapshot {
            manifest: RouteManifest::new(vec![
                node(1, "/", None),
                node(2, "/blog", Some(1)),
                node(3, "/blog/post-1", Some(2)),
            ]),
            protections: ProtectionStore::new(rules),
            ..Default::default()
        }
    }

    fn decide_for(snapshot: &Snapshot, path: &str, creds: &FakeCreds) -> EdgeDecision {
        let aliases = LegacyAliases::default();
        let allow = AllowList::default();
        decide(
            snapshot,
            &aliases,
            None,
            &allow,
            path,
            creds,
            OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        )
    }

    #[test]
    fn test_open_page_passes_with_id() {
        let snapshot = site(vec![]);
        let decision = decide_for(&snapshot, "/blog/post-1", &FakeCreds::default());
        assert_eq!(
            decision,
            EdgeDecision::Pass {
                canonical: "/blog/post-1".to_string(),
                page_id: Some(pid(3)),
            }
        );
    }

    #[test]
    fn test_unknown_path_passes_unresolved() {
        let snapshot = site(vec![]);
        let decision = decide_for(&snapshot, "/nowhere", &FakeCreds::default());
        assert_eq!(
            decision,
            EdgeDecision::Pass {
                canonical: "/nowhere".to_string(),
                page_id: None,
            }
        );
    }

    #[test]
    fn test_non_canonical_form_redirects_permanently() {
        let snapshot = site(vec![]);
        let decision = decide_for(&snapshot, "/blog/post-1/", &FakeCreds::default());
        assert_eq!(
            decision,
            EdgeDecision::Redirect {
                kind: RedirectKind::Permanent,
                target: "/blog/post-1".to_string(),
            }
        );

        let decision = decide_for(&snapshot, "/blog/list/post-1", &FakeCreds::default());
        assert_eq!(
            decision,
            EdgeDecision::Redirect {
                kind: RedirectKind::Permanent,
                target: "/blog/post-1".to_string(),
            }
        );
    }

    #[test]
    fn test_protected_page_challenges_without_session() {
        let snapshot = site(vec![password_rule(9, 2, "sesame")]);
        let decision = decide_for(&snapshot, "/blog/post-1", &FakeCreds::default());
        assert_eq!(
            decision,
            EdgeDecision::Challenge {
                rule_id: Uuid::from_u128(9),
                next: "/blog/post-1".to_string(),
            }
        );
    }

    #[test]
    fn test_valid_session_artifact_passes() {
        let rule = password_rule(9, 2, "sesame");
        let artifact = rule.credential.as_ref().unwrap().to_string();
        let snapshot = site(vec![rule]);

        let mut creds = FakeCreds::default();
        creds.cookies.insert(
            session_cookie_name(&Uuid::from_u128(9)),
            artifact,
        );

        let decision = decide_for(&snapshot, "/blog/post-1", &creds);
        assert!(matches!(decision, EdgeDecision::Pass { .. }));
    }

    #[test]
    fn test_wrong_session_artifact_still_challenges() {
        let snapshot = site(vec![password_rule(9, 2, "sesame")]);
        let mut creds = FakeCreds::default();
        creds.cookies.insert(
            session_cookie_name(&Uuid::from_u128(9)),
            "ffff.0000".to_string(),
        );
        let decision = decide_for(&snapshot, "/blog/post-1", &creds);
        assert!(matches!(decision, EdgeDecision::Challenge { .. }));
    }

    #[test]
    fn test_federated_rule_without_verifier_challenges() {
        let rule = ProtectedRule {
            id: Uuid::from_u128(9),
            page_id: Some(pid(2)),
            path: String::new(),
            match_mode: MatchMode::Prefix,
            auth_mode: AuthMode::FederatedIdentity,
            credential: None,
            enabled: true,
        };
        let snapshot = site(vec![rule]);
        let mut creds = FakeCreds::default();
        creds.identity = Some("whatever.token".to_string());
        let decision = decide_for(&snapshot, "/blog/post-1", &creds);
        assert!(matches!(decision, EdgeDecision::Challenge { .. }));
    }

    #[test]
    fn test_federated_rule_checks_allow_list() {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine as _;
        use ed25519_dalek::{Signer, SigningKey};

        let signing = SigningKey::from_bytes(&[5u8; 32]);
        let verifier = IdentityVerifier::new(signing.verifying_key());
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();

        let mint = |sub: &str| {
            let payload = serde_json::to_vec(&serde_json::json!({
                "sub": sub,
                "exp": now.unix_timestamp() + 600,
            }))
            .unwrap();
            let signature = signing.sign(&payload);
            format!(
                "{}.{}",
                URL_SAFE_NO_PAD.encode(&payload),
                URL_SAFE_NO_PAD.encode(signature.to_bytes())
            )
        };

        let rule = ProtectedRule {
            id: Uuid::from_u128(9),
            page_id: Some(pid(2)),
            path: String::new(),
            match_mode: MatchMode::Prefix,
            auth_mode: AuthMode::FederatedIdentity,
            credential: None,
            enabled: true,
        };
        let snapshot = site(vec![rule]);
        let aliases = LegacyAliases::default();
        let allow = AllowList::new(["ok@example.com".to_string()]);

        let mut creds = FakeCreds::default();
        creds.identity = Some(mint("ok@example.com"));
        let decision = decide(
            &snapshot,
            &aliases,
            Some(&verifier),
            &allow,
            "/blog/post-1",
            &creds,
            now,
        );
        assert!(matches!(decision, EdgeDecision::Pass { .. }));

        creds.identity = Some(mint("stranger@example.com"));
        let decision = decide(
            &snapshot,
            &aliases,
            Some(&verifier),
            &allow,
            "/blog/post-1",
            &creds,
            now,
        );
        assert!(matches!(decision, EdgeDecision::Challenge { .. }));
    }

    #[test]
    fn test_bare_id_redirects_before_auth() {
        let snapshot = site(vec![password_rule(9, 2, "sesame")]);
        let decision = decide_for(
            &snapshot,
            "/00000000000000000000000000000003",
            &FakeCreds::default(),
        );
        assert_eq!(
            decision,
            EdgeDecision::Redirect {
                kind: RedirectKind::Permanent,
                target: "/blog/post-1".to_string(),
            }
        );
    }
}
