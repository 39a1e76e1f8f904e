//! # Storage Invariants
//!
//! Checkable on any committed state; the workspace test suite asserts
//! them after every scenario.

use super::entities::{BucketInfo, InternalBucketInfo};
use crate::keys;
use shared_store::kv::get_obj;
use shared_store::KvRead;
use shared_types::Address;

/// Per-owner bucket count never exceeds the cap.
#[must_use]
pub fn check_bucket_count(store: &dyn KvRead, owner: Address, max: u64) -> bool {
    let count: u64 = get_obj(store, &keys::bucket_count_key(owner)).unwrap_or(0);
    count <= max
}

/// A bucket's total charge size equals the sum of its local groups'.
#[must_use]
pub fn check_charge_size_consistency(internal: &InternalBucketInfo) -> bool {
    let sum: u64 = internal.local_virtual_groups.iter().map(|lvg| lvg.total_charge_size).sum();
    internal.total_charge_size == sum
}

/// The per-owner counter matches the stored buckets.
#[must_use]
pub fn check_counter_matches_store(store: &dyn KvRead, owner: Address) -> bool {
    let counted = store
        .scan_prefix(&keys::bucket_prefix())
        .into_iter()
        .filter(|(_, bytes)| {
            let bucket: BucketInfo = bincode::deserialize(bytes)
                .unwrap_or_else(|e| panic!("corrupt bucket: {e}"));
            bucket.owner == owner
        })
        .count() as u64;
    let counter: u64 = get_obj(store, &keys::bucket_count_key(owner)).unwrap_or(0);
    counted == counter
}
