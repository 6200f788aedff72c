//! The exclusion store facade: owns an interval slab plus the two secondary
//! indexes over it, and implements the public query/mutation contract.

use crate::error::ExclusionError;
use crate::index::id_map::IdMap;
use crate::index::mass_tree::MassIntervalTree;
use crate::index::Handle;
use crate::model::{ExclusionInterval, ExclusionPoint};

/// Snapshot of store size, returned by [`ExclusionStore::stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    pub len: usize,
    pub id_table_len: usize,
    pub class: &'static str,
}

/// The multiset of exclusion intervals, indexed for fast mass-stab and
/// mass-range-overlap queries with the other four dimensions post-filtered.
#[derive(Default)]
pub struct ExclusionStore {
    slab: Vec<Option<ExclusionInterval>>,
    free: Vec<Handle>,
    mass_tree: MassIntervalTree,
    id_map: IdMap,
    len: usize,
}

impl ExclusionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a flat list of previously-valid records, e.g. a
    /// decoded persistence snapshot. Fails on the first record that no
    /// longer satisfies `add`'s contract, without mutating any existing
    /// store — callers swap this result in only on success.
    pub fn from_records(records: Vec<ExclusionInterval>) -> Result<Self, ExclusionError> {
        let mut store = Self::new();
        for record in records {
            store.add(record)?;
        }
        Ok(store)
    }

    /// A clone of every stored interval, in slab order. Used by `save` to
    /// snapshot under the gate before streaming to disk.
    pub fn records(&self) -> Vec<ExclusionInterval> {
        self.slab.iter().flatten().cloned().collect()
    }

    /// Insert `interval`. Requires a non-null id and a valid bound
    /// ordering; duplicates are permitted.
    pub fn add(&mut self, interval: ExclusionInterval) -> Result<(), ExclusionError> {
        if interval.interval_id.is_none() {
            return Err(ExclusionError::InvalidInterval(
                "interval_id must be non-null".into(),
            ));
        }
        if !interval.is_valid() {
            return Err(ExclusionError::InvalidInterval(
                "a min bound exceeds its max bound".into(),
            ));
        }
        let handle = self.alloc(interval);
        let stored = self.slab[handle].as_ref().expect("just inserted");
        self.mass_tree.insert(handle, stored.min_mass, stored.max_mass);
        self.id_map.insert(stored.interval_id.as_deref().expect("checked above"), handle);
        self.len += 1;
        Ok(())
    }

    /// Remove every stored interval `Q` contains, returning the removed
    /// records.
    pub fn remove(&mut self, query: &ExclusionInterval) -> Vec<ExclusionInterval> {
        let candidates = if query.is_id_only_query() {
            self.id_map
                .handles_for(query.interval_id.as_deref().expect("checked by is_id_only_query"))
        } else {
            self.mass_candidates(query.min_mass, query.max_mass)
        };

        let matches: Vec<Handle> = if query.is_id_only_query() {
            candidates
        } else {
            candidates
                .into_iter()
                .filter(|&h| {
                    let stored = self.slab[h].as_ref().expect("handle in tree is live");
                    query.query_contains(stored)
                })
                .collect()
        };

        let mut removed = Vec::with_capacity(matches.len());
        for handle in matches {
            let interval = self.slab[handle].take().expect("matched handle is live");
            self.mass_tree.remove(handle);
            if let Some(id) = &interval.interval_id {
                self.id_map.remove(id, handle);
            }
            self.free.push(handle);
            self.len -= 1;
            removed.push(interval);
        }
        removed
    }

    /// All stored intervals overlapping `query`. Non-destructive.
    pub fn query_by_interval(&self, query: &ExclusionInterval) -> Vec<ExclusionInterval> {
        self.mass_candidates(query.min_mass, query.max_mass)
            .into_iter()
            .filter_map(|h| self.slab[h].as_ref())
            .filter(|stored| query.overlaps(stored))
            .cloned()
            .collect()
    }

    /// All stored intervals containing `point`. A null point mass matches
    /// every stored mass bound, so the candidate set in that case is the
    /// whole store (see `mass_candidates`).
    pub fn query_by_point(&self, point: &ExclusionPoint) -> Vec<ExclusionInterval> {
        self.mass_candidates(point.mass, point.mass)
            .into_iter()
            .filter_map(|h| self.slab[h].as_ref())
            .filter(|stored| stored.contains_point(point))
            .cloned()
            .collect()
    }

    /// `true` iff `query_by_point(point)` would be non-empty; short-circuits
    /// on the first match instead of collecting.
    pub fn is_excluded(&self, point: &ExclusionPoint) -> bool {
        self.mass_candidates(point.mass, point.mass)
            .into_iter()
            .filter_map(|h| self.slab[h].as_ref())
            .any(|stored| stored.contains_point(point))
    }

    /// Empty the store, returning the prior size.
    pub fn clear(&mut self) -> usize {
        let prior = self.len;
        self.slab.clear();
        self.free.clear();
        self.mass_tree.clear();
        self.id_map.clear();
        self.len = 0;
        prior
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            len: self.len,
            id_table_len: self.id_map.distinct_id_count(),
            class: "ExclusionStore",
        }
    }

    /// Candidate handles whose mass range overlaps `[min, max]` (`None`
    /// bounds read as infinite on that side), via the mass index. A safe
    /// over-approximation for both `overlaps` and `query_contains` — since
    /// containment implies overlap, filtering afterward is always correct.
    fn mass_candidates(&self, min: Option<f64>, max: Option<f64>) -> Vec<Handle> {
        self.mass_tree.range_overlap(
            min.unwrap_or(f64::NEG_INFINITY),
            max.unwrap_or(f64::INFINITY),
        )
    }

    fn alloc(&mut self, interval: ExclusionInterval) -> Handle {
        if let Some(handle) = self.free.pop() {
            self.slab[handle] = Some(interval);
            handle
        } else {
            self.slab.push(Some(interval));
            self.slab.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(id: &str, min_mass: f64, max_mass: f64) -> ExclusionInterval {
        ExclusionInterval {
            interval_id: Some(id.to_string()),
            charge: None,
            min_mass: Some(min_mass),
            max_mass: Some(max_mass),
            min_rt: None,
            max_rt: None,
            min_ook0: None,
            max_ook0: None,
            min_intensity: None,
            max_intensity: None,
        }
    }

    fn point(mass: f64) -> ExclusionPoint {
        ExclusionPoint {
            charge: None,
            mass: Some(mass),
            rt: None,
            ook0: None,
            intensity: None,
        }
    }

    #[test]
    fn add_requires_non_null_id() {
        let mut store = ExclusionStore::new();
        let mut i = interval("x", 1.0, 2.0);
        i.interval_id = None;
        let err = store.add(i).unwrap_err();
        assert!(matches!(err, ExclusionError::InvalidInterval(_)));
    }

    #[test]
    fn add_rejects_invalid_bounds() {
        let mut store = ExclusionStore::new();
        let i = interval("x", 10.0, 5.0);
        assert!(store.add(i).is_err());
    }

    #[test]
    fn add_then_query_by_point_finds_it() {
        let mut store = ExclusionStore::new();
        store.add(interval("A", 100.0, 200.0)).unwrap();
        let hits = store.query_by_point(&point(150.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].interval_id.as_deref(), Some("A"));
        assert!(store.is_excluded(&point(150.0)));
        assert!(!store.is_excluded(&point(9999.0)));
    }

    #[test]
    fn duplicates_are_preserved() {
        let mut store = ExclusionStore::new();
        store.add(interval("A", 100.0, 200.0)).unwrap();
        store.add(interval("A", 100.0, 200.0)).unwrap();
        assert_eq!(store.stats().len, 2);
        assert_eq!(store.stats().id_table_len, 1);
        assert_eq!(store.query_by_point(&point(150.0)).len(), 2);
    }

    #[test]
    fn remove_by_id_only_deletes_every_matching_id() {
        let mut store = ExclusionStore::new();
        store.add(interval("A", 100.0, 200.0)).unwrap();
        store.add(interval("A", 500.0, 600.0)).unwrap();
        store.add(interval("B", 700.0, 800.0)).unwrap();

        let query = ExclusionInterval {
            interval_id: Some("A".into()),
            ..empty()
        };

        let removed = store.remove(&query);
        assert_eq!(removed.len(), 2);
        assert_eq!(store.stats().len, 1);
        assert!(!store.stats().class.is_empty());
    }

    #[test]
    fn remove_by_bounded_query_only_removes_contained_intervals() {
        let mut store = ExclusionStore::new();
        store.add(interval("A", 100.0, 200.0)).unwrap();
        store.add(interval("B", 1000.0, 2000.0)).unwrap();

        let query = ExclusionInterval {
            interval_id: None,
            charge: None,
            min_mass: Some(0.0),
            max_mass: Some(500.0),
            min_rt: None,
            max_rt: None,
            min_ook0: None,
            max_ook0: None,
            min_intensity: None,
            max_intensity: None,
        };
        let removed = store.remove(&query);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].interval_id.as_deref(), Some("A"));
        assert_eq!(store.stats().len, 1);
    }

    #[test]
    fn query_by_interval_is_non_destructive() {
        let mut store = ExclusionStore::new();
        store.add(interval("A", 100.0, 200.0)).unwrap();
        let query = interval("unused", 150.0, 160.0);
        let hits = store.query_by_interval(&query);
        assert_eq!(hits.len(), 1);
        assert_eq!(store.stats().len, 1);
    }

    #[test]
    fn clear_returns_prior_size_and_empties_store() {
        let mut store = ExclusionStore::new();
        store.add(interval("A", 100.0, 200.0)).unwrap();
        store.add(interval("B", 300.0, 400.0)).unwrap();
        assert_eq!(store.clear(), 2);
        assert_eq!(store.stats().len, 0);
        assert!(store.query_by_point(&point(150.0)).is_empty());
    }

    #[test]
    fn from_records_round_trips_and_rejects_invalid() {
        let records = vec![interval("A", 1.0, 2.0), interval("B", 3.0, 4.0)];
        let store = ExclusionStore::from_records(records).unwrap();
        assert_eq!(store.stats().len, 2);

        let mut bad = interval("A", 1.0, 2.0);
        bad.interval_id = None;
        assert!(ExclusionStore::from_records(vec![bad]).is_err());
    }

    #[test]
    fn freed_slab_slot_is_reused() {
        let mut store = ExclusionStore::new();
        store.add(interval("A", 1.0, 2.0)).unwrap();
        store.remove(&ExclusionInterval {
            interval_id: Some("A".into()),
            ..empty()
        });
        store.add(interval("B", 3.0, 4.0)).unwrap();
        assert_eq!(store.records().len(), 1);
    }

    fn empty() -> ExclusionInterval {
        ExclusionInterval {
            interval_id: None,
            charge: None,
            min_mass: None,
            max_mass: None,
            min_rt: None,
            max_rt: None,
            min_ook0: None,
            max_ook0: None,
            min_intensity: None,
            max_intensity: None,
        }
    }
}
