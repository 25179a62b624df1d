//! Write-path client for the upstream content service.
//!
//! Admin writes mutate the upstream source of truth and only become visible
//! to resolution at the next snapshot load; the resolution core never sees a
//! partially applied write. Implementations must be safely retryable:
//! setting the same override twice is a no-op, not an error.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use common::id::PageId;
use common::snapshot::ProtectedRule;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream content service unavailable: {0}")]
    Unavailable(String),
    #[error("upstream rejected the write: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait UpstreamStore: Send + Sync {
    /// Assign (or with `None`, clear) the route override for a page.
    async fn set_override(
        &self,
        page_id: PageId,
        route_path: Option<String>,
    ) -> Result<(), UpstreamError>;

    /// Create or replace a protection rule.
    async fn set_protection(&self, rule: ProtectedRule) -> Result<(), UpstreamError>;

    /// Remove the protection rule keyed by `page_id`/`path`.
    async fn clear_protection(
        &self,
        page_id: Option<PageId>,
        path: &str,
    ) -> Result<(), UpstreamError>;
}

/// In-memory upstream, used by tests and standalone runs. Real deployments
/// plug in a client for the content service's API instead.
#[derive(Debug, Default)]
pub struct MemoryUpstream {
    overrides: Mutex<BTreeMap<PageId, String>>,
    protections: Mutex<Vec<ProtectedRule>>,
}

impl MemoryUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn override_for(&self, page_id: &PageId) -> Option<String> {
        self.overrides.lock().get(page_id).cloned()
    }

    pub fn protections(&self) -> Vec<ProtectedRule> {
        self.protections.lock().clone()
    }
}

#[async_trait]
impl UpstreamStore for MemoryUpstream {
    async fn set_override(
        &self,
        page_id: PageId,
        route_path: Option<String>,
    ) -> Result<(), UpstreamError> {
        let mut overrides = self.overrides.lock();
        match route_path {
            Some(path) => {
                overrides.insert(page_id, path);
            }
            None => {
                overrides.remove(&page_id);
            }
        }
        Ok(())
    }

    async fn set_protection(&self, rule: ProtectedRule) -> Result<(), UpstreamError> {
        let mut protections = self.protections.lock();
        // Replace any rule covering the same key, keep the rest.
        protections.retain(|r| !(r.page_id == rule.page_id && r.path == rule.path));
        protections.push(rule);
        Ok(())
    }

    async fn clear_protection(
        &self,
        page_id: Option<PageId>,
        path: &str,
    ) -> Result<(), UpstreamError> {
        self.protections
            .lock()
            .retain(|r| !(r.page_id == page_id && r.path == path));
        Ok(())
    }
}
