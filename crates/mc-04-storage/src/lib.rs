//! # mc-04-storage
//!
//! Storage engine for Moca-Chain.
//!
//! ## Role in System
//!
//! The user-facing metadata machine: buckets, objects, groups and
//! policies, coupled to the payment engine (stream fees), the virtual
//! group engine (placement) and the EVM (ERC-721 object twins).
//!
//! ## Hard Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Per-owner bucket count ≤ `max_buckets_per_account` | `service/bucket.rs` |
//! | Approval signature gates bucket creation and copies | `approval.rs` |
//! | Empty objects seal at creation and never mint an NFT | `service/object.rs` |
//! | Non-empty seal mints; sealed delete burns exactly once | `service/object.rs` |
//! | A failed burn aborts the delete atomically | burn errors propagate before any write commits |
//! | Versioned params are append-only, queried by ≤-timestamp | `service/mod.rs` |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod approval;
pub mod domain;
pub mod events;
pub mod keys;
pub mod permission;
pub mod ports;
pub mod service;

pub use domain::entities::{
    BucketInfo, GroupInfo, GroupMember, InternalBucketInfo, LocalVirtualGroup, ObjectInfo,
    Policy, Statement, StorageParams, VersionedParams,
};
pub use domain::errors::StorageError;
pub use domain::value_objects::{
    ActionType, BucketStatus, Effect, ObjectStatus, Principal, ResourceType,
};
pub use ports::ObjectNftApi;
pub use service::StorageService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
