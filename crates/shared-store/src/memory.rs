//! # In-Memory KV Adapter
//!
//! `BTreeMap`-backed store. The ordered map gives ascending-key iteration
//! for free, which is the property every deterministic scan relies on.

use crate::kv::{KvRead, KvStore, KvWrite};
use std::collections::BTreeMap;
use std::ops::Bound;

/// In-memory ordered KV store.
#[derive(Clone, Debug, Default)]
pub struct MemStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { data: BTreeMap::new() }
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if no pairs are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Full ordered view (used by the reconciliation snapshotter).
    pub fn entries(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.data
    }
}

impl KvRead for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl KvWrite for MemStore {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.data.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.data.remove(key);
    }
}

impl KvStore for MemStore {}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_prefix_ordering() {
        let mut store = MemStore::new();
        store.set(vec![1, 3], vec![30]);
        store.set(vec![1, 1], vec![10]);
        store.set(vec![2, 1], vec![99]);
        store.set(vec![1, 2], vec![20]);

        let scanned = store.scan_prefix(&[1]);
        assert_eq!(
            scanned,
            vec![
                (vec![1, 1], vec![10]),
                (vec![1, 2], vec![20]),
                (vec![1, 3], vec![30]),
            ]
        );
    }

    #[test]
    fn test_delete() {
        let mut store = MemStore::new();
        store.set(vec![1], vec![1]);
        store.delete(&[1]);
        assert!(!store.has(&[1]));
    }
}
