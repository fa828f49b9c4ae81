//! Shared, async-safe handle to a context.
//!
//! Capabilities are fetched outside any lock. An append is announced with
//! [`SharedContext::begin_append`] before the fetch starts; when two fetches
//! for the same URL overlap, only the most recently announced one is applied.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use wms_protocol::WmsCapabilities;

use crate::context::OwsContext;
use crate::error::ContextResult;
use crate::resource::ResourceId;

/// Claim on a pending capabilities append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendTicket {
    pub href: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The subtree was appended; ids in pre-order.
    Applied(Vec<ResourceId>),
    /// A newer append for the same URL was announced; this one was dropped.
    Superseded { generation: u64, latest: u64 },
}

#[derive(Clone)]
pub struct SharedContext {
    inner: Arc<RwLock<OwsContext>>,
    appends: Arc<Mutex<HashMap<String, u64>>>,
    next_generation: Arc<AtomicU64>,
}

impl SharedContext {
    pub fn new(context: OwsContext) -> Self {
        Self {
            inner: Arc::new(RwLock::new(context)),
            appends: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Clone of the current context.
    pub async fn snapshot(&self) -> OwsContext {
        self.inner.read().await.clone()
    }

    pub async fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&OwsContext) -> R,
    {
        let guard = self.inner.read().await;
        f(&guard)
    }

    /// Run `f` against a staged copy and publish it only if `f` succeeds.
    pub async fn mutate<F, R>(&self, f: F) -> ContextResult<R>
    where
        F: FnOnce(&mut OwsContext) -> ContextResult<R>,
    {
        let mut guard = self.inner.write().await;
        let (next, result) = guard.with_mutation(f)?;
        *guard = next;
        Ok(result)
    }

    /// Announce an append for `href`; any earlier pending ticket for the
    /// same URL is superseded.
    pub async fn begin_append(&self, href: &str) -> AppendTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        self.appends
            .lock()
            .await
            .insert(href.to_string(), generation);
        debug!(href, generation, "append announced");
        AppendTicket {
            href: href.to_string(),
            generation,
        }
    }

    /// Apply fetched capabilities if `ticket` is still the latest for its URL.
    pub async fn complete_append(
        &self,
        ticket: AppendTicket,
        capabilities: WmsCapabilities,
    ) -> ContextResult<AppendOutcome> {
        let mut appends = self.appends.lock().await;
        let latest = appends.get(&ticket.href).copied().unwrap_or(0);
        if latest != ticket.generation {
            debug!(
                href = %ticket.href,
                generation = ticket.generation,
                latest,
                "append superseded"
            );
            return Ok(AppendOutcome::Superseded {
                generation: ticket.generation,
                latest,
            });
        }
        appends.remove(&ticket.href);

        let mut guard = self.inner.write().await;
        let ids = guard.append_wms(&ticket.href, capabilities)?;
        Ok(AppendOutcome::Applied(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Position;
    use crate::resource::Resource;
    use wms_protocol::CapabilityLayer;

    fn caps(name: &str) -> WmsCapabilities {
        WmsCapabilities {
            version: "1.3.0".to_string(),
            service_title: None,
            service_abstract: None,
            get_capabilities_href: None,
            get_map_href: None,
            get_map_formats: Vec::new(),
            root_layer: CapabilityLayer {
                name: Some(name.to_string()),
                title: name.to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_latest_append_wins() {
        let shared = SharedContext::new(OwsContext::empty());
        let first = shared.begin_append("https://example.org/wms").await;
        let second = shared.begin_append("https://example.org/wms").await;

        let outcome = shared.complete_append(second, caps("neu")).await.unwrap();
        assert!(matches!(outcome, AppendOutcome::Applied(ref ids) if ids.len() == 1));

        let outcome = shared.complete_append(first, caps("alt")).await.unwrap();
        assert!(matches!(outcome, AppendOutcome::Superseded { .. }));

        let titles = shared
            .read(|c| c.features().iter().map(|r| r.title().to_string()).collect::<Vec<_>>())
            .await;
        assert_eq!(titles, vec!["neu"]);
    }

    #[tokio::test]
    async fn test_different_urls_do_not_interfere() {
        let shared = SharedContext::new(OwsContext::empty());
        let a = shared.begin_append("https://a.example/wms").await;
        let b = shared.begin_append("https://b.example/wms").await;
        shared.complete_append(b, caps("b")).await.unwrap();
        shared.complete_append(a, caps("a")).await.unwrap();
        assert_eq!(shared.snapshot().await.len(), 2);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let shared = SharedContext::new(OwsContext::empty());
        let mut snapshot = tokio_test::block_on(shared.snapshot());
        snapshot
            .insert_feature(None, Resource::new("a".into(), "A"), Position::LastChild)
            .unwrap();
        assert!(tokio_test::block_on(shared.read(|c| c.is_empty())));
    }

    #[tokio::test]
    async fn test_failed_mutation_is_not_published() {
        let shared = SharedContext::new(OwsContext::empty());
        let result = shared
            .mutate(|c| {
                c.append_wms("https://a.example/wms", caps("a"))?;
                c.remove_feature(&ResourceId::new("missing"))
            })
            .await;
        assert!(result.is_err());
        assert!(shared.snapshot().await.is_empty());
    }
}
