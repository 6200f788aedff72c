//! The concurrency gate: a single `Mutex<ExclusionStore>` plus the
//! process-wide [`OffsetRegister`], exposing the public operation set as
//! single-element and batched variants. No suspension points occur inside
//! the gated critical section.

use std::path::Path;
use std::sync::Mutex;

use crate::error::ExclusionError;
use crate::model::{ExclusionInterval, ExclusionPoint};
use crate::offset::{Offset, OffsetRegister};
use crate::persistence;
use crate::store::{ExclusionStore, StoreStats};

/// The top-level handle applications hold: one gate over one store, plus
/// the offset register queries apply themselves against.
pub struct ExclusionEngine {
    store: Mutex<ExclusionStore>,
    offset: OffsetRegister,
}

impl Default for ExclusionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusionEngine {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(ExclusionStore::new()),
            offset: OffsetRegister::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ExclusionStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add(&self, interval: ExclusionInterval) -> Result<(), ExclusionError> {
        self.lock().add(interval)
    }

    /// Validates every element before mutating anything; then applies each
    /// element under its own gate acquisition — batch validation is atomic,
    /// batch execution is not.
    pub fn add_batch(&self, intervals: Vec<ExclusionInterval>) -> Result<(), ExclusionError> {
        for interval in &intervals {
            validate_interval(interval)?;
        }
        for interval in intervals {
            self.lock().add(interval)?;
        }
        Ok(())
    }

    pub fn remove(&self, query: &ExclusionInterval) -> Result<Vec<ExclusionInterval>, ExclusionError> {
        if !query.is_valid() {
            return Err(ExclusionError::InvalidInterval(
                "a min bound exceeds its max bound".into(),
            ));
        }
        let removed = self.lock().remove(query);
        tracing::debug!(count = removed.len(), "remove matched intervals");
        Ok(removed)
    }

    pub fn remove_batch(
        &self,
        queries: &[ExclusionInterval],
    ) -> Result<Vec<Vec<ExclusionInterval>>, ExclusionError> {
        for query in queries {
            if !query.is_valid() {
                return Err(ExclusionError::InvalidInterval(
                    "a min bound exceeds its max bound".into(),
                ));
            }
        }
        Ok(queries
            .iter()
            .map(|query| {
                let removed = self.lock().remove(query);
                tracing::debug!(count = removed.len(), "remove matched intervals");
                removed
            })
            .collect())
    }

    pub fn query_by_interval(&self, query: &ExclusionInterval) -> Vec<ExclusionInterval> {
        self.lock().query_by_interval(query)
    }

    pub fn query_by_interval_batch(
        &self,
        queries: &[ExclusionInterval],
    ) -> Result<Vec<Vec<ExclusionInterval>>, ExclusionError> {
        for query in queries {
            validate_interval(query)?;
        }
        Ok(queries
            .iter()
            .map(|q| self.lock().query_by_interval(q))
            .collect())
    }

    /// Applies the current offset to a copy of `point` before querying; the
    /// caller's `point` is untouched.
    pub fn query_by_point(&self, point: &ExclusionPoint) -> Vec<ExclusionInterval> {
        let shifted = self.offset.get().apply(point);
        self.lock().query_by_point(&shifted)
    }

    /// Reads the offset once for the whole batch, at the start rather than
    /// per element.
    pub fn query_by_point_batch(&self, points: &[ExclusionPoint]) -> Vec<Vec<ExclusionInterval>> {
        let offset = self.offset.get();
        points
            .iter()
            .map(|p| self.lock().query_by_point(&offset.apply(p)))
            .collect()
    }

    pub fn is_excluded(&self, point: &ExclusionPoint) -> bool {
        let shifted = self.offset.get().apply(point);
        self.lock().is_excluded(&shifted)
    }

    pub fn is_excluded_batch(&self, points: &[ExclusionPoint]) -> Vec<bool> {
        let offset = self.offset.get();
        points
            .iter()
            .map(|p| self.lock().is_excluded(&offset.apply(p)))
            .collect()
    }

    pub fn clear(&self) -> usize {
        self.lock().clear()
    }

    pub fn stats(&self) -> StoreStats {
        self.lock().stats()
    }

    pub fn offset_get(&self) -> Offset {
        self.offset.get()
    }

    pub fn offset_set(&self, mass: f64, rt: f64, ook0: f64, intensity: f64) {
        self.offset.set(mass, rt, ook0, intensity);
    }

    /// Snapshots the store under the gate, then streams to disk with the
    /// gate released.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ExclusionError> {
        let records = self.lock().records();
        persistence::write_to_path(path, &records)?;
        Ok(())
    }

    /// Reads and decodes outside the gate, builds the replacement store
    /// fully, then swaps it in under a single brief gate acquisition. A
    /// failed decode never touches the live store.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(), ExclusionError> {
        let path = path.as_ref();
        let records = persistence::read_from_path(path).map_err(|e| match e {
            ExclusionError::PersistenceError(msg) if is_not_found(path, &msg) => {
                ExclusionError::NotFound(path.display().to_string())
            }
            other => other,
        })?;
        let fresh = ExclusionStore::from_records(records)?;

        let mut guard = self.lock();
        if guard.stats().len > 0 {
            tracing::warn!(path = %path.display(), "load is replacing a non-empty store");
        }
        *guard = fresh;
        Ok(())
    }
}

fn is_not_found(path: &Path, _msg: &str) -> bool {
    !path.exists()
}

fn validate_interval(interval: &ExclusionInterval) -> Result<(), ExclusionError> {
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
    Ok(())
}
