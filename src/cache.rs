//! Three-tier singleton cache
//!
//! - completed: fully built and injected singletons
//! - early: allocated singletons whose injection is still running
//! - factories: suppliers that materialize an early reference on demand
//!
//! Plus the set of ids currently under construction. An id is never in both
//! the completed and the early tier.

use crate::definition::Bean;
use ahash::RandomState;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Supplier returning an in-progress instance
pub(crate) type EarlyFactory = Arc<dyn Fn() -> Bean + Send + Sync>;

/// Number of entries in each tier, for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub completed: usize,
    pub early: usize,
    pub factories: usize,
    pub in_progress: usize,
}

pub(crate) struct SingletonCache {
    completed: DashMap<String, Bean, RandomState>,
    early: DashMap<String, Bean, RandomState>,
    factories: DashMap<String, EarlyFactory, RandomState>,
    in_progress: DashSet<String, RandomState>,
}

impl SingletonCache {
    /// A handful of shards is plenty for the bean counts a container holds.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let shard_amount = if capacity <= 64 { 8 } else { 16 };
        Self {
            completed: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
            early: DashMap::with_hasher_and_shard_amount(RandomState::new(), 4),
            factories: DashMap::with_hasher_and_shard_amount(RandomState::new(), 4),
            in_progress: DashSet::with_hasher(RandomState::new()),
        }
    }

    #[inline]
    pub(crate) fn completed(&self, id: &str) -> Option<Bean> {
        self.completed.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Recover an early reference: the early tier first, then the factory
    /// tier. A factory hit is promoted into the early tier and dropped.
    pub(crate) fn early_reference(&self, id: &str) -> Option<Bean> {
        if let Some(bean) = self.early.get(id).map(|entry| Arc::clone(entry.value())) {
            #[cfg(feature = "logging")]
            trace!(target: "bean_container", bean = id, tier = "early", "Early reference hit");
            return Some(bean);
        }

        let (key, factory) = self.factories.remove(id)?;
        let bean = factory();

        #[cfg(feature = "logging")]
        trace!(target: "bean_container", bean = id, tier = "factory", "Early reference materialized");

        self.early.insert(key, Arc::clone(&bean));
        Some(bean)
    }

    /// Expose a freshly allocated instance before its injection completes
    pub(crate) fn publish_early(&self, id: &str, bean: &Bean) {
        let supplied = Arc::clone(bean);
        self.factories
            .insert(id.to_owned(), Arc::new(move || Arc::clone(&supplied)));
        self.early.insert(id.to_owned(), Arc::clone(bean));
    }

    /// Move a fully built singleton into the completed tier
    pub(crate) fn complete(&self, id: &str, bean: Bean) {
        self.discard_early(id);
        self.completed.insert(id.to_owned(), bean);
    }

    pub(crate) fn discard_early(&self, id: &str) {
        self.early.remove(id);
        self.factories.remove(id);
    }

    pub(crate) fn take_completed(&self, id: &str) -> Option<Bean> {
        self.completed.remove(id).map(|(_, bean)| bean)
    }

    #[inline]
    pub(crate) fn is_in_progress(&self, id: &str) -> bool {
        self.in_progress.contains(id)
    }

    /// Mark `id` as under construction. The returned guard clears the mark
    /// and any early state left behind when it is dropped, on every exit path.
    pub(crate) fn begin<'a>(&'a self, id: &'a str) -> InProgressGuard<'a> {
        self.in_progress.insert(id.to_owned());
        InProgressGuard { cache: self, id }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            completed: self.completed.len(),
            early: self.early.len(),
            factories: self.factories.len(),
            in_progress: self.in_progress.len(),
        }
    }
}

pub(crate) struct InProgressGuard<'a> {
    cache: &'a SingletonCache,
    id: &'a str,
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        self.cache.in_progress.remove(self.id);
        // No-op after a successful `complete`
        self.cache.discard_early(self.id);
    }
}
