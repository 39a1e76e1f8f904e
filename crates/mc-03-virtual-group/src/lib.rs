//! # mc-03-virtual-group
//!
//! Virtual-group engine for Moca-Chain.
//!
//! ## Role in System
//!
//! Buckets are placed on a **family**: the set of global virtual groups
//! (GVGs) sharing one primary SP. Each GVG carries an ordered list of
//! secondary SPs implementing erasure-coded redundancy, a deposit locked
//! against its stored size, and a virtual payment account receiving
//! storage fees.
//!
//! ## Lifecycle
//!
//! - GVGs are created on demand (family id 0 creates a family lazily)
//!   and deleted only when empty
//! - Primary handover runs as swap-out (predecessor initiates with a
//!   successor approval) or swap-in (successor reserves, then completes)
//! - SP exit is two-phase: request moves the SP to `GRACEFUL_EXITING`,
//!   completion requires every group drained
//!
//! The storage engine is reached through a late-bound handle
//! ([`ports::StorageStatsApi`]) set after construction; the two engines
//! reference each other and the handle breaks the cycle.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod events;
pub mod keys;
pub mod ports;
pub mod service;

pub use domain::entities::{GlobalVirtualGroup, GvgFamily, SwapInInfo, SwapOutInfo, VgParams};
pub use domain::errors::VgError;
pub use ports::{StorageStatsApi, VirtualGroupApi};
pub use service::VirtualGroupService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
