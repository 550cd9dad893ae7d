//! Views of one pending commit.

use std::sync::Arc;

use shapeval_core::source::{Delta, SharedSource};

use crate::memory_store::MemoryStore;

/// The state a validation pass runs against: the data as it will be after the
/// commit, plus the added/removed delta and whether the store was empty before.
#[derive(Clone)]
pub struct Transaction {
    after: SharedSource,
    delta: Delta,
    base_empty: bool,
}

impl Transaction {
    /// Apply `removed` then `added` to `before`.
    ///
    /// Statements in `added` that already exist in `before`, and statements in
    /// `removed` that never existed, are dropped from the delta so the dirty
    /// check only sees real changes.
    pub fn new(before: MemoryStore, added: MemoryStore, removed: MemoryStore) -> Self {
        let base_empty = before.is_empty();
        let removed: MemoryStore = removed.iter().filter(|st| before.contains(st)).cloned().collect();
        let added: MemoryStore = added
            .iter()
            .filter(|st| !before.contains(st) || removed.contains(st))
            .cloned()
            .collect();

        let mut after = before;
        for st in removed.iter() {
            after.remove(st);
        }
        after.extend(added.iter().cloned());

        Self {
            after: Arc::new(after),
            delta: Delta::new(Arc::new(added), Arc::new(removed)),
            base_empty,
        }
    }

    /// First commit into an empty store.
    pub fn initial(added: MemoryStore) -> Self {
        Self::new(MemoryStore::new(), added, MemoryStore::new())
    }

    /// Wrap views produced by an external storage layer.
    pub fn from_views(after: SharedSource, delta: Delta, base_empty: bool) -> Self {
        Self {
            after,
            delta,
            base_empty,
        }
    }

    pub fn after(&self) -> &SharedSource {
        &self.after
    }

    pub fn delta(&self) -> &Delta {
        &self.delta
    }

    pub fn base_empty(&self) -> bool {
        self.base_empty
    }
}
