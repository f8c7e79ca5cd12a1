// src/cache.rs
//! Process-wide snapshot cell. One writer (the pipeline) swaps in complete
//! snapshots; readers take an `Arc` without locking and keep a consistent view
//! even if a newer snapshot lands meanwhile.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{IntelligenceSnapshot, ScoredItem};

#[derive(Default)]
pub struct SnapshotStore {
    inner: ArcSwapOption<IntelligenceSnapshot>,
}

/// Staleness summary reported by `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub last_updated: Option<DateTime<Utc>>,
    pub item_count: usize,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first successful run.
    pub fn current(&self) -> Option<Arc<IntelligenceSnapshot>> {
        self.inner.load_full()
    }

    /// Replace the current snapshot wholesale; returns the shared handle.
    pub fn publish(&self, snapshot: IntelligenceSnapshot) -> Arc<IntelligenceSnapshot> {
        let snap = Arc::new(snapshot);
        self.inner.store(Some(snap.clone()));
        snap
    }

    /// Lookup scoped to the current snapshot.
    pub fn find_item(&self, id: u64) -> Option<ScoredItem> {
        let guard = self.inner.load();
        (*guard).as_ref()?.find_item(id).cloned()
    }

    pub fn status(&self) -> CacheStatus {
        let guard = self.inner.load();
        match (*guard).as_ref() {
            Some(s) => CacheStatus {
                last_updated: Some(s.generated_at),
                item_count: s.items.len(),
            },
            None => CacheStatus {
                last_updated: None,
                item_count: 0,
            },
        }
    }
}
