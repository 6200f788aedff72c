//! Reverse index from `interval_id` to the multiset of slab handles stored
//! under that id. A plain map behind the store's own gate, with no locking
//! of its own.

use std::collections::{HashMap, HashSet};

use super::Handle;

#[derive(Default)]
pub struct IdMap {
    by_id: HashMap<String, HashSet<Handle>>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, handle: Handle) {
        self.by_id.entry(id.to_string()).or_default().insert(handle);
    }

    /// Remove `handle` from `id`'s set, dropping the entry entirely once
    /// empty.
    pub fn remove(&mut self, id: &str, handle: Handle) {
        if let Some(set) = self.by_id.get_mut(id) {
            set.remove(&handle);
            if set.is_empty() {
                self.by_id.remove(id);
            }
        }
    }

    /// All handles currently stored under `id`, or an empty slice if the id
    /// is unknown.
    pub fn handles_for(&self, id: &str) -> Vec<Handle> {
        self.by_id
            .get(id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn distinct_id_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
    }
}
