//! # Storage Store Keys
//!
//! Buckets key by their globally unique name; objects by
//! `bucket_name / object_name` (bucket names cannot contain `/`). Id
//! indexes point back at the natural keys for the bridge and the NFT
//! twins.

use crate::domain::value_objects::{Principal, ResourceType};
use shared_store::kv::namespaces;
use shared_types::{Address, BucketId, GroupId, ObjectId, PolicyId, Uint};

const BUCKET: u8 = 0x01;
const BUCKET_ID_INDEX: u8 = 0x02;
const INTERNAL_BUCKET: u8 = 0x03;
const OBJECT: u8 = 0x04;
const OBJECT_ID_INDEX: u8 = 0x05;
const GROUP: u8 = 0x06;
const GROUP_ID_INDEX: u8 = 0x07;
const GROUP_MEMBER: u8 = 0x08;
const POLICY: u8 = 0x09;
const POLICY_INDEX: u8 = 0x0A;
const POLICY_EXPIRATION: u8 = 0x0B;
const SEQ_BUCKET: u8 = 0x0C;
const SEQ_OBJECT: u8 = 0x0D;
const SEQ_GROUP: u8 = 0x0E;
const SEQ_POLICY: u8 = 0x0F;
const BUCKET_COUNT: u8 = 0x10;
const PARAMS: u8 = 0x11;
const VERSIONED_PARAMS: u8 = 0x12;
const DELETE_QUEUE_BUCKET: u8 = 0x13;
const DELETE_QUEUE_OBJECT: u8 = 0x14;
const DISCONTINUE_COUNT: u8 = 0x15;
const ORIGINAL_STATUS: u8 = 0x16;
const FAMILY_BUCKET_COUNT: u8 = 0x17;

fn uint_bytes(id: Uint) -> [u8; 32] {
    let mut out = [0u8; 32];
    id.to_big_endian(&mut out);
    out
}

/// Bucket by name.
pub fn bucket_key(name: &str) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, BUCKET];
    key.extend_from_slice(name.as_bytes());
    key
}

/// Prefix over every bucket.
pub fn bucket_prefix() -> Vec<u8> {
    vec![namespaces::STORAGE, BUCKET]
}

/// Bucket id → name.
pub fn bucket_id_index_key(id: BucketId) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, BUCKET_ID_INDEX];
    key.extend_from_slice(&uint_bytes(id));
    key
}

/// Charging state by bucket id.
pub fn internal_bucket_key(id: BucketId) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, INTERNAL_BUCKET];
    key.extend_from_slice(&uint_bytes(id));
    key
}

/// Object by `(bucket, name)`.
pub fn object_key(bucket_name: &str, object_name: &str) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, OBJECT];
    key.extend_from_slice(bucket_name.as_bytes());
    key.push(b'/');
    key.extend_from_slice(object_name.as_bytes());
    key
}

/// Prefix over a bucket's objects.
pub fn object_bucket_prefix(bucket_name: &str) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, OBJECT];
    key.extend_from_slice(bucket_name.as_bytes());
    key.push(b'/');
    key
}

/// Object id → `(bucket, name)`.
pub fn object_id_index_key(id: ObjectId) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, OBJECT_ID_INDEX];
    key.extend_from_slice(&uint_bytes(id));
    key
}

/// Group by `(owner, name)`.
pub fn group_key(owner: Address, name: &str) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, GROUP];
    key.extend_from_slice(owner.as_bytes());
    key.extend_from_slice(name.as_bytes());
    key
}

/// Group id → `(owner, name)`.
pub fn group_id_index_key(id: GroupId) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, GROUP_ID_INDEX];
    key.extend_from_slice(&uint_bytes(id));
    key
}

/// Membership by `(group, member)`.
pub fn group_member_key(group_id: GroupId, member: Address) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, GROUP_MEMBER];
    key.extend_from_slice(&uint_bytes(group_id));
    key.extend_from_slice(member.as_bytes());
    key
}

/// Prefix over a group's members, ordered by address.
pub fn group_member_prefix(group_id: GroupId) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, GROUP_MEMBER];
    key.extend_from_slice(&uint_bytes(group_id));
    key
}

/// Policy by id.
pub fn policy_key(id: PolicyId) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, POLICY];
    key.extend_from_slice(&uint_bytes(id));
    key
}

/// Policy id by `(resource, principal)`.
pub fn policy_index_key(
    resource_type: ResourceType,
    resource_id: Uint,
    principal: &Principal,
) -> Vec<u8> {
    let mut key = policy_resource_prefix(resource_type, resource_id);
    key.extend_from_slice(&principal.index_bytes());
    key
}

/// Prefix over every policy attached to one resource.
pub fn policy_resource_prefix(resource_type: ResourceType, resource_id: Uint) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, POLICY_INDEX, resource_type.key_byte()];
    key.extend_from_slice(&uint_bytes(resource_id));
    key
}

/// Expiration queue entry `(expiration, policy)`.
pub fn policy_expiration_key(expiration: i64, id: PolicyId) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, POLICY_EXPIRATION];
    key.extend_from_slice(&(expiration as u64).to_be_bytes());
    key.extend_from_slice(&uint_bytes(id));
    key
}

/// Prefix over the policy expiration queue, ordered by time.
pub fn policy_expiration_prefix() -> Vec<u8> {
    vec![namespaces::STORAGE, POLICY_EXPIRATION]
}

/// Sequence keys.
pub fn bucket_sequence_key() -> Vec<u8> {
    vec![namespaces::STORAGE, SEQ_BUCKET]
}

/// Next object id.
pub fn object_sequence_key() -> Vec<u8> {
    vec![namespaces::STORAGE, SEQ_OBJECT]
}

/// Next group id.
pub fn group_sequence_key() -> Vec<u8> {
    vec![namespaces::STORAGE, SEQ_GROUP]
}

/// Next policy id.
pub fn policy_sequence_key() -> Vec<u8> {
    vec![namespaces::STORAGE, SEQ_POLICY]
}

/// Per-owner bucket counter.
pub fn bucket_count_key(owner: Address) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, BUCKET_COUNT];
    key.extend_from_slice(owner.as_bytes());
    key
}

/// Governance parameters.
pub fn params_key() -> Vec<u8> {
    vec![namespaces::STORAGE, PARAMS]
}

/// Versioned params by effective timestamp (ascending).
pub fn versioned_params_key(timestamp: i64) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, VERSIONED_PARAMS];
    key.extend_from_slice(&(timestamp as u64).to_be_bytes());
    key
}

/// Prefix over all versioned params.
pub fn versioned_params_prefix() -> Vec<u8> {
    vec![namespaces::STORAGE, VERSIONED_PARAMS]
}

/// Bucket deletion queue entry `(height, bucket id)` → name.
pub fn bucket_delete_key(height: u64, id: BucketId) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, DELETE_QUEUE_BUCKET];
    key.extend_from_slice(&height.to_be_bytes());
    key.extend_from_slice(&uint_bytes(id));
    key
}

/// Prefix over the bucket deletion queue.
pub fn bucket_delete_prefix() -> Vec<u8> {
    vec![namespaces::STORAGE, DELETE_QUEUE_BUCKET]
}

/// Object deletion queue entry `(height, object id)` → `(bucket, name)`.
pub fn object_delete_key(height: u64, id: ObjectId) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, DELETE_QUEUE_OBJECT];
    key.extend_from_slice(&height.to_be_bytes());
    key.extend_from_slice(&uint_bytes(id));
    key
}

/// Prefix over the object deletion queue.
pub fn object_delete_prefix() -> Vec<u8> {
    vec![namespaces::STORAGE, DELETE_QUEUE_OBJECT]
}

/// Discontinue rate-limit window by `(kind, account)`.
pub fn discontinue_count_key(kind: u8, account: Address) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, DISCONTINUE_COUNT, kind];
    key.extend_from_slice(account.as_bytes());
    key
}

/// Status an object held before it was discontinued.
pub fn original_status_key(id: ObjectId) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, ORIGINAL_STATUS];
    key.extend_from_slice(&uint_bytes(id));
    key
}

/// Buckets placed on a family.
pub fn family_bucket_count_key(family_id: u32) -> Vec<u8> {
    let mut key = vec![namespaces::STORAGE, FAMILY_BUCKET_COUNT];
    key.extend_from_slice(&family_id.to_be_bytes());
    key
}

/// Height parsed back out of a deletion queue key.
pub fn delete_key_height(key: &[u8]) -> u64 {
    u64::from_be_bytes(key[2..10].try_into().unwrap_or_else(|_| panic!("malformed delete key")))
}
