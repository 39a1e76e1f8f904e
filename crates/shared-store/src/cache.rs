//! # Cache Context
//!
//! Buffered write overlay over a read view. Reads fall through to the
//! base; writes and tombstones stay in the overlay until committed.
//! Dropping the overlay discards everything, which is how a failed
//! message rolls back. Nesting an overlay over another overlay backs EVM
//! snapshots.

use crate::kv::{KvRead, KvWrite};
use std::collections::BTreeMap;

/// A buffered write set over a base read view.
pub struct CacheContext<'a> {
    base: &'a dyn KvRead,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheContext<'a> {
    /// Create an empty overlay over `base`.
    pub fn new(base: &'a dyn KvRead) -> Self {
        Self { base, writes: BTreeMap::new() }
    }

    /// Consume the overlay and return its ordered write set.
    /// `None` values are tombstones.
    pub fn into_writes(self) -> Vec<(Vec<u8>, Option<Vec<u8>>)> {
        self.writes.into_iter().collect()
    }

    /// Number of buffered writes (tombstones included).
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }
}

/// Apply a write set produced by [`CacheContext::into_writes`].
pub fn apply_writes(target: &mut dyn KvWrite, writes: Vec<(Vec<u8>, Option<Vec<u8>>)>) {
    for (key, value) in writes {
        match value {
            Some(v) => target.set(key, v),
            None => target.delete(&key),
        }
    }
}

impl KvRead for CacheContext<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(Some(v)) => Some(v.clone()),
            Some(None) => None,
            None => self.base.get(key),
        }
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.base.scan_prefix(prefix).into_iter().collect();
        for (key, value) in self.writes.range::<Vec<u8>, _>(..) {
            if !key.starts_with(prefix) {
                continue;
            }
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}

impl KvWrite for CacheContext<'_> {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        // Tombstone even if the base lacks the key; a prior overlay write
        // in this same message may have created it.
        self.writes.insert(key.to_vec(), None);
    }
}

// =============================================================================
// TESTS
// =============================================================================
