//! # Entity Identifiers
//!
//! Entity ids are monotonically increasing and allocated by the owning
//! module's sequence counter. Small registries use `u32`; user-facing
//! entities (buckets, objects, groups, policies) use unsigned 256-bit
//! ids so they can be mirrored into EVM words unchanged.

pub use primitive_types::U256 as Uint;

/// Storage provider id.
pub type SpId = u32;

/// Global virtual group id.
pub type GvgId = u32;

/// Global virtual group family id.
pub type FamilyId = u32;

/// Local virtual group id (scoped per bucket).
pub type LvgId = u32;

/// Bucket id (global sequence).
pub type BucketId = Uint;

/// Object id (global sequence).
pub type ObjectId = Uint;

/// Group id (global sequence).
pub type GroupId = Uint;

/// Policy id (global sequence).
pub type PolicyId = Uint;

/// Family id value meaning "pick or create a family for me".
pub const NO_SPECIFIED_FAMILY_ID: FamilyId = 0;
