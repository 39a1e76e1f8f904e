//! # Shared Enums
//!
//! Source and visibility markers carried by buckets, objects and groups.
//! Both are referenced by the storage engine and the bridge, so they live
//! here rather than in either crate.

use serde::{Deserialize, Serialize};

/// Where an entity originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SourceType {
    /// Created by a native transaction.
    #[default]
    Origin,
    /// Mirror to the destination chain is in flight.
    MirrorPending,
    /// Created through an inbound cross-chain packet.
    CrossChain,
}

/// Read visibility of a bucket or object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Visibility {
    /// Only the owner and policy grantees.
    #[default]
    Private,
    /// World-readable.
    PublicRead,
    /// Objects inherit the bucket's visibility.
    Inherit,
}
