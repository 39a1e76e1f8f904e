//! # Storage Entities

use super::value_objects::{
    ActionType, BucketStatus, Effect, ObjectStatus, Principal, Resource,
};
use serde::{Deserialize, Serialize};
use shared_types::{
    Address, BucketId, FamilyId, GroupId, GvgId, Hash, LvgId, ObjectId, PolicyId, SourceType,
    Visibility,
};

/// A bucket: the namespace objects live in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    /// Global sequence id.
    pub id: BucketId,
    /// Globally unique DNS-compatible name.
    pub name: String,
    /// Owner account.
    pub owner: Address,
    /// Stream account paying the bucket's fees.
    pub payment_address: Address,
    /// Operator address of the primary SP.
    pub primary_sp_address: Address,
    /// Family the bucket is placed on.
    pub gvg_family_id: FamilyId,
    /// Read visibility.
    pub visibility: Visibility,
    /// Prepaid read quota in bytes.
    pub charged_read_quota: u64,
    /// Lifecycle status.
    pub status: BucketStatus,
    /// Where the bucket originated.
    pub source_type: SourceType,
    /// Unix seconds of creation.
    pub created_at: i64,
}

/// Charging state stored beside each bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InternalBucketInfo {
    /// Price snapshot time all the bucket's flows were computed at.
    pub price_time: i64,
    /// Sum of the local groups' charge sizes.
    pub total_charge_size: u64,
    /// Local virtual groups, ordered by id.
    pub local_virtual_groups: Vec<LocalVirtualGroup>,
    /// Next local group id (per-bucket sequence).
    pub next_lvg_id: LvgId,
    /// Live objects in the bucket.
    pub object_count: u64,
    /// Height of the last charged-read-quota change.
    pub last_quota_update_height: u64,
}

/// A bucket-scoped slice of one global virtual group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVirtualGroup {
    /// Per-bucket id.
    pub id: LvgId,
    /// Backing global group.
    pub gvg_id: GvgId,
    /// Σ charge size of objects landed here.
    pub total_charge_size: u64,
    /// Σ payload bytes of sealed objects landed here.
    pub stored_size: u64,
}

/// An object: a named, checksummed byte blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Global sequence id.
    pub id: ObjectId,
    /// Owning bucket name.
    pub bucket_name: String,
    /// Object name, unique within the bucket.
    pub name: String,
    /// Owner account.
    pub owner: Address,
    /// Payload size in bytes; zero-size objects seal at creation.
    pub payload_size: u64,
    /// Segment checksums.
    pub checksums: Vec<Hash>,
    /// Lifecycle status.
    pub status: ObjectStatus,
    /// Local virtual group the payload landed on (0 while empty).
    pub lvg_id: LvgId,
    /// Unix seconds of creation.
    pub created_at: i64,
    /// Unix seconds of the last content update.
    pub updated_at: i64,
    /// Where the object originated.
    pub source_type: SourceType,
    /// Read visibility.
    pub visibility: Visibility,
}

/// A group of accounts policies can reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Global sequence id.
    pub id: GroupId,
    /// Owner account.
    pub owner: Address,
    /// Name, unique per owner.
    pub name: String,
    /// Free-form metadata.
    pub extra: String,
    /// Member count (cap enforced on update).
    pub member_count: u64,
}

/// Membership record; the member address lives in the key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GroupMember {
    /// Unix seconds the membership lapses; `None` never expires.
    pub expiration: Option<i64>,
}

impl GroupMember {
    /// True when the membership is still valid at `now`.
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expiration.map(|exp| exp > now).unwrap_or(true)
    }
}

/// One grant or denial inside a policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Actions covered.
    pub actions: Vec<ActionType>,
    /// Allow or deny.
    pub effect: Effect,
    /// Unix seconds the statement lapses; `None` never expires.
    pub expiration_time: Option<i64>,
}

/// A policy binding a principal to a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Global sequence id.
    pub id: PolicyId,
    /// Who the policy binds.
    pub principal: Principal,
    /// What it binds them to.
    pub resource: Resource,
    /// Grants and denials.
    pub statements: Vec<Statement>,
    /// Whole-policy expiration; `None` never expires.
    pub expiration_time: Option<i64>,
    /// Unix seconds of creation.
    pub created_at: i64,
}

/// Segment/EC parameters, append-only and versioned by timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedParams {
    /// Unix seconds this version took effect.
    pub timestamp: i64,
    /// Max payload segment size.
    pub max_segment_size: u64,
    /// Erasure-coding data chunks.
    pub ec_data_chunks: u32,
    /// Erasure-coding parity chunks.
    pub ec_parity_chunks: u32,
    /// Minimum chargeable size for a non-empty object.
    pub min_charge_size: u64,
}

impl Default for VersionedParams {
    fn default() -> Self {
        Self {
            timestamp: 0,
            max_segment_size: 16 * 1024 * 1024,
            ec_data_chunks: 4,
            ec_parity_chunks: 2,
            min_charge_size: 128 * 1024,
        }
    }
}

/// Governance parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageParams {
    /// Hard cap on buckets per owner.
    pub max_buckets_per_account: u64,
    /// Rate-limit window (blocks) for discontinue calls.
    pub discontinue_counting_window: u64,
    /// Objects one account may discontinue per window.
    pub discontinue_object_max: u64,
    /// Buckets one account may discontinue per window.
    pub discontinue_bucket_max: u64,
    /// Grace blocks before forced deletion.
    pub discontinue_confirm_period: u64,
    /// Forced deletions per block.
    pub discontinue_deletion_max: u64,
    /// Expired policies GC'd per block.
    pub stale_policy_cleanup_max: u64,
    /// Min blocks between charged-read-quota changes.
    pub min_quota_update_interval: u64,
    /// Local groups one bucket may fan out to.
    pub max_local_virtual_group_num_per_bucket: u32,
    /// Members one group may hold.
    pub max_group_num: u64,
    /// Statements one policy may hold.
    pub max_statements_num: u32,
}

impl Default for StorageParams {
    fn default() -> Self {
        Self {
            max_buckets_per_account: 100,
            discontinue_counting_window: 10_000,
            discontinue_object_max: u64::MAX,
            discontinue_bucket_max: u64::MAX,
            discontinue_confirm_period: 5,
            discontinue_deletion_max: 100,
            stale_policy_cleanup_max: 200,
            min_quota_update_interval: 2592,
            max_local_virtual_group_num_per_bucket: 10,
            max_group_num: 10_000,
            max_statements_num: 10,
        }
    }
}
