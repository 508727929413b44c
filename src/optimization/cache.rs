//! Result cache keyed by request digest
//!
//! Optimization is deterministic for a given optimizer, so identical requests
//! can share one result. The entry lock is held while the result is computed,
//! which makes concurrent identical requests compute at most once.

use dashmap::DashMap;
use tracing::debug;

use crate::types::{OptimizationRequest, OptimizationResult};

pub struct ResultCache {
    entries: DashMap<String, OptimizationResult>,
    max_entries: usize,
}

impl ResultCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Digest of the request's canonical JSON form.
    ///
    /// `None` if the request cannot be serialized, in which case it is not
    /// cached.
    pub fn key_for(request: &OptimizationRequest) -> Option<String> {
        let canonical = serde_json::to_vec(request).ok()?;
        Some(format!("{:x}", md5::compute(canonical)))
    }

    /// Cached result for `request`, computing and storing it on a miss.
    pub fn get_or_compute<F>(&self, request: &OptimizationRequest, compute: F) -> OptimizationResult
    where
        F: FnOnce() -> OptimizationResult,
    {
        let Some(key) = Self::key_for(request) else {
            return compute();
        };

        if let Some(hit) = self.entries.get(&key) {
            debug!(key = %key, "Result cache hit");
            return hit.value().clone();
        }

        if self.entries.len() >= self.max_entries {
            debug!(entries = self.entries.len(), "Result cache full, clearing");
            self.entries.clear();
        }

        self.entries
            .entry(key)
            .or_insert_with(compute)
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}
