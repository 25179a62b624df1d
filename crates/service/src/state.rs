use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;

use common::auth::federated::{AllowList, IdentityError, IdentityVerifier};
use common::routes::LegacyAliases;
use common::snapshot::{Snapshot, SnapshotSummary};

use super::config::Config;
use super::upstream::UpstreamStore;

/// Main service state - one atomic snapshot handle plus the collaborators
/// the HTTP surface needs.
///
/// The snapshot lives behind an [`ArcSwap`]: reads are lock-free and a
/// rebuild swaps a single reference, so no in-flight request can observe one
/// store's old data mixed with another store's new data.
#[derive(Clone)]
pub struct State {
    inner: Arc<StateInner>,
}

struct StateInner {
    snapshot: ArcSwap<Snapshot>,
    snapshot_dir: PathBuf,
    aliases: LegacyAliases,
    upstream: Arc<dyn UpstreamStore>,
    identity_verifier: Option<IdentityVerifier>,
    allow_list: AllowList,
    login_path: String,
    cookie_secure: bool,
    admin_enabled: bool,
}

impl State {
    pub fn from_config(
        config: &Config,
        upstream: Arc<dyn UpstreamStore>,
    ) -> Result<Self, StateSetupError> {
        // 1. Identity provider key, when federated rules are in play
        let identity_verifier = config
            .identity_key_hex
            .as_deref()
            .map(IdentityVerifier::from_hex)
            .transpose()?;

        // 2. Initial snapshot load; missing artifacts degrade to empty stores
        let snapshot = Snapshot::load(&config.snapshot_dir);
        let summary = snapshot.summary();
        tracing::info!(
            nodes = summary.nodes,
            overrides = summary.overrides,
            protections = summary.protections,
            dir = %config.snapshot_dir.display(),
            "snapshot loaded"
        );

        Ok(Self {
            inner: Arc::new(StateInner {
                snapshot: ArcSwap::from_pointee(snapshot),
                snapshot_dir: config.snapshot_dir.clone(),
                aliases: LegacyAliases::default(),
                upstream,
                identity_verifier,
                allow_list: AllowList::new(config.allowed_subjects.iter().cloned()),
                login_path: config.login_path.clone(),
                cookie_secure: config.cookie_secure,
                admin_enabled: config.admin_enabled,
            }),
        })
    }

    /// The snapshot to resolve this request against. Hold the returned `Arc`
    /// for the whole request so every decision sees one consistent build.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.snapshot.load_full()
    }

    /// Re-read the artifact directory and swap the snapshot reference.
    pub fn reload_snapshot(&self) -> SnapshotSummary {
        let snapshot = Snapshot::load(&self.inner.snapshot_dir);
        let summary = snapshot.summary();
        self.inner.snapshot.store(Arc::new(snapshot));
        tracing::info!(
            nodes = summary.nodes,
            overrides = summary.overrides,
            protections = summary.protections,
            "snapshot swapped"
        );
        summary
    }

    pub fn aliases(&self) -> &LegacyAliases {
        &self.inner.aliases
    }

    pub fn upstream(&self) -> &Arc<dyn UpstreamStore> {
        &self.inner.upstream
    }

    pub fn identity_verifier(&self) -> Option<&IdentityVerifier> {
        self.inner.identity_verifier.as_ref()
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.inner.allow_list
    }

    pub fn login_path(&self) -> &str {
        &self.inner.login_path
    }

    pub fn cookie_secure(&self) -> bool {
        self.inner.cookie_secure
    }

    pub fn admin_enabled(&self) -> bool {
        self.inner.admin_enabled
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("invalid identity provider key: {0}")]
    IdentityKey(#[from] IdentityError),
}
