//! Cross-filter coordination store
//!
//! One store per mounted dashboard. The state is an immutable
//! [`StoreSnapshot`] swapped atomically on every mutation, so a reader never
//! observes global filters from one update and selections from another.
//! Subscribers are woken through a `watch` channel carrying the filter
//! version.

use arc_swap::ArcSwap;
use crossfilter_shared::{FilterRule, Selection, StoreSnapshot, WidgetId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

struct StoreInner {
    snapshot: ArcSwap<StoreSnapshot>,
    /// Serializes writers; readers never take it
    write_lock: Mutex<()>,
    version_tx: watch::Sender<u64>,
}

/// Injectable, cloneable handle to one dashboard session's filter state.
/// Clones share state; separately constructed stores never do.
#[derive(Clone)]
pub struct CrossFilterStore {
    inner: Arc<StoreInner>,
}

impl Default for CrossFilterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossFilterStore {
    pub fn new() -> Self {
        let (version_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                snapshot: ArcSwap::from_pointee(StoreSnapshot::default()),
                write_lock: Mutex::new(()),
                version_tx,
            }),
        }
    }

    /// Consistent view of filters, selections and edit mode
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.inner.snapshot.load_full()
    }

    /// Current filter version
    pub fn version(&self) -> u64 {
        self.inner.snapshot.load().version
    }

    /// Receiver woken whenever filters or selections change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version_tx.subscribe()
    }

    pub fn edit_mode(&self) -> bool {
        self.inner.snapshot.load().edit_mode
    }

    /// Add a global filter. A rule whose id is already present replaces it
    /// in place.
    pub fn add_global_filter(&self, rule: FilterRule) {
        self.mutate(|snapshot| {
            let filters = &mut snapshot.global_filters;
            match filters.iter().position(|f| f.id == rule.id) {
                Some(index) if filters[index] == rule => false,
                Some(index) => {
                    filters[index] = rule;
                    true
                }
                None => {
                    filters.push(rule);
                    true
                }
            }
        });
    }

    pub fn remove_global_filter(&self, id: &str) {
        self.mutate(|snapshot| {
            let before = snapshot.global_filters.len();
            snapshot.global_filters.retain(|f| f.id != id);
            snapshot.global_filters.len() != before
        });
    }

    pub fn clear_global_filters(&self) {
        self.mutate(|snapshot| {
            let changed = !snapshot.global_filters.is_empty();
            snapshot.global_filters.clear();
            changed
        });
    }

    /// Replace `widget`'s click selection. `None` or an empty map clears it.
    pub fn set_selection(&self, widget: &WidgetId, selection: Option<Selection>) {
        self.mutate(|snapshot| match selection.filter(|s| !s.is_empty()) {
            Some(selection) => {
                let previous = snapshot.selections.insert(widget.clone(), selection.clone());
                previous.as_ref() != Some(&selection)
            }
            None => snapshot.selections.remove(widget).is_some(),
        });
    }

    pub fn clear_all_selections(&self) {
        self.mutate(|snapshot| {
            let changed = !snapshot.selections.is_empty();
            snapshot.selections.clear();
            changed
        });
    }

    /// Flip the dashboard edit flag and return the new value. Edit mode is
    /// not filter state: the version does not move and nobody is notified.
    pub fn toggle_edit_mode(&self) -> bool {
        let _guard = self.inner.write_lock.lock();
        let mut next = StoreSnapshot::clone(&self.inner.snapshot.load());
        next.edit_mode = !next.edit_mode;
        let edit_mode = next.edit_mode;
        self.inner.snapshot.store(Arc::new(next));
        edit_mode
    }

    /// Effective filter set for `widget`, derived from a single snapshot
    pub fn derive_effective_filters(
        &self,
        widget: &WidgetId,
        saved_filters: &[FilterRule],
    ) -> Vec<FilterRule> {
        self.snapshot().effective_filters(widget, saved_filters)
    }

    /// Hard reset used when the dashboard view unmounts
    pub fn reset(&self) {
        let _guard = self.inner.write_lock.lock();
        let current = self.inner.snapshot.load_full();
        let version = current.version + 1;
        self.inner.snapshot.store(Arc::new(StoreSnapshot {
            version,
            ..StoreSnapshot::default()
        }));
        self.inner.version_tx.send_replace(version);
        log::info!("Cross-filter store reset at version {version}");
    }

    /// Apply `f` to a copy of the current snapshot; publish it under a new
    /// version only when `f` reports a filter change.
    fn mutate(&self, f: impl FnOnce(&mut StoreSnapshot) -> bool) {
        let _guard = self.inner.write_lock.lock();
        let current = self.inner.snapshot.load_full();
        let mut next = StoreSnapshot::clone(&current);
        if !f(&mut next) {
            return;
        }

        next.version += 1;
        let version = next.version;
        let detection = next.detect_changes_from(&current);
        log::debug!(
            "Store version {}: {}",
            version,
            detection.change_summary.join("; ")
        );
        self.inner.snapshot.store(Arc::new(next));
        self.inner.version_tx.send_replace(version);
    }
}
