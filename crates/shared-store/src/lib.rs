//! # shared-store
//!
//! Deterministic state plumbing for the block-processing lane.
//!
//! ## Role in System
//!
//! - **Single Shared Resource**: the KV store is the only mutable state;
//!   writes happen exclusively on the block-processing lane
//! - **Cache Contexts**: every message runs inside an overlay that is
//!   committed on success and dropped on failure; nested overlays back
//!   EVM snapshots
//! - **Gas Meter**: the only intra-block deadline; exhaustion aborts the
//!   current message and the overlay is discarded
//!
//! ## Module Structure
//!
//! ```text
//! shared-store/
//! ├── kv.rs        # Ordered KV ports + bincode codec helpers
//! ├── memory.rs    # BTreeMap adapter (tests, light nodes)
//! ├── rocks.rs     # RocksDB adapter (production)
//! ├── cache.rs     # CacheContext overlay with commit/discard
//! ├── context.rs   # Per-message Context (block, gas, events, flags)
//! ├── gas.rs       # GasMeter
//! ├── events.rs    # Block event manager
//! ├── bank.rs      # Balance/supply store (fixed wire keys)
//! └── diff.rs      # Namespace snapshot diffing (reconciliation)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bank;
pub mod cache;
pub mod context;
pub mod diff;
pub mod errors;
pub mod events;
pub mod gas;
pub mod kv;
pub mod memory;
pub mod rocks;

pub use bank::{BankApi, BankStore};
pub use cache::CacheContext;
pub use context::Context;
pub use errors::StoreError;
pub use events::{Event, EventManager};
pub use gas::GasMeter;
pub use kv::{get_obj, namespaces, put_obj, KvRead, KvStore, KvWrite};
pub use memory::MemStore;
pub use rocks::RocksStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
