//! # Namespace Diffing
//!
//! Snapshot a module namespace before a block, diff after. The lifecycle
//! controller uses this to reconcile bank and payment deltas across each
//! committed block.

use crate::kv::KvRead;
use std::collections::BTreeMap;

/// One changed key within a namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KvDelta {
    /// Full key including the namespace byte.
    pub key: Vec<u8>,
    /// Value before the block, if any.
    pub before: Option<Vec<u8>>,
    /// Value after the block, if any.
    pub after: Option<Vec<u8>>,
}

/// Ordered snapshot of all pairs under a namespace byte.
pub fn snapshot_namespace(store: &dyn KvRead, namespace: u8) -> BTreeMap<Vec<u8>, Vec<u8>> {
    store.scan_prefix(&[namespace]).into_iter().collect()
}

/// Keys whose values changed between two snapshots, ascending.
pub fn diff_snapshots(
    before: &BTreeMap<Vec<u8>, Vec<u8>>,
    after: &BTreeMap<Vec<u8>, Vec<u8>>,
) -> Vec<KvDelta> {
    let mut deltas = Vec::new();
    for (key, old) in before {
        match after.get(key) {
            Some(new) if new == old => {}
            other => deltas.push(KvDelta {
                key: key.clone(),
                before: Some(old.clone()),
                after: other.cloned(),
            }),
        }
    }
    for (key, new) in after {
        if !before.contains_key(key) {
            deltas.push(KvDelta { key: key.clone(), before: None, after: Some(new.clone()) });
        }
    }
    deltas.sort_by(|a, b| a.key.cmp(&b.key));
    deltas
}

// =============================================================================
// TESTS
// =============================================================================
