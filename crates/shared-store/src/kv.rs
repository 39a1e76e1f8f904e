//! # KV Ports
//!
//! Ordered key-value ports. Adapters MUST iterate keys in ascending byte
//! order; replay equivalence across nodes depends on it.
//!
//! Values are bincode-encoded serde entities. A value that fails to
//! decode is corrupted committed state, which is consensus-critical: the
//! codec helpers panic rather than let nodes diverge.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Module namespaces. Every key begins with one of these bytes, which is
/// what the reconciliation diff groups by.
pub mod namespaces {
    /// Bank balances and supply.
    pub const BANK: u8 = 0x01;
    /// Stream payment records.
    pub const PAYMENT: u8 = 0x02;
    /// Storage provider registry.
    pub const SP: u8 = 0x03;
    /// Global/local virtual groups.
    pub const VIRTUAL_GROUP: u8 = 0x04;
    /// Buckets, objects, groups, policies.
    pub const STORAGE: u8 = 0x05;
    /// Cross-chain channel sequences and mirrors.
    pub const CROSS_CHAIN: u8 = 0x06;
    /// EVM-side bookkeeping (object NFT twins).
    pub const EVM: u8 = 0x07;
    /// Scheduled upgrade plans.
    pub const UPGRADE: u8 = 0x08;
}

/// Read side of the KV port.
pub trait KvRead {
    /// Point lookup.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// All pairs whose key starts with `prefix`, ascending by key.
    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;

    /// True if the key exists.
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Write side of the KV port.
pub trait KvWrite: KvRead {
    /// Insert or overwrite.
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Remove if present.
    fn delete(&mut self, key: &[u8]);
}

/// A committable base store (memory or RocksDB adapter).
pub trait KvStore: KvWrite + Send + Sync {}

/// Encode and store a serde entity.
pub fn put_obj<T: Serialize>(store: &mut dyn KvWrite, key: Vec<u8>, value: &T) {
    let bytes = bincode::serialize(value)
        .unwrap_or_else(|e| panic!("state encode failed for key {}: {e}", hex_key(&key)));
    store.set(key, bytes);
}

/// Load and decode a serde entity.
///
/// # Panics
///
/// Panics on undecodable bytes: committed state is corrupt and the node
/// must halt rather than diverge.
pub fn get_obj<T: DeserializeOwned>(store: &dyn KvRead, key: &[u8]) -> Option<T> {
    store.get(key).map(|bytes| {
        bincode::deserialize(&bytes)
            .unwrap_or_else(|e| panic!("state decode failed for key {}: {e}", hex_key(key)))
    })
}

fn hex_key(key: &[u8]) -> String {
    key.iter().map(|b| format!("{b:02x}")).collect()
}

// =============================================================================
// TESTS
// =============================================================================
