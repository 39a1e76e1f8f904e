//! # Storage Value Objects

use serde::{Deserialize, Serialize};
use shared_types::{Address, GroupId, Uint};

/// Bucket lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BucketStatus {
    /// Live.
    #[default]
    Created,
    /// Soft-deleted, awaiting forced GC.
    Discontinued,
    /// Primary handover in flight.
    Migrating,
}

/// Object lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ObjectStatus {
    /// Created, payload not yet sealed.
    #[default]
    Created,
    /// Payload and checksums acknowledged by the SPs.
    Sealed,
    /// Soft-deleted, awaiting forced GC.
    Discontinued,
}

/// Actions a policy statement may grant or deny.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    /// Everything on the resource.
    TypeAll,
    /// Mutate bucket metadata.
    UpdateBucketInfo,
    /// Delete the bucket.
    DeleteBucket,
    /// Create objects in the bucket.
    CreateObject,
    /// Delete an object.
    DeleteObject,
    /// Copy an object out of the bucket.
    CopyObject,
    /// Read object payload.
    GetObject,
    /// Overwrite sealed object content.
    UpdateObjectContent,
    /// Add or remove group members.
    UpdateGroupMember,
    /// Delete the group.
    DeleteGroup,
    /// Update the group's extra field.
    UpdateGroupExtra,
}

/// Statement effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Grant.
    Allow,
    /// Explicit denial; wins over any allow.
    Deny,
}

/// Who a policy binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    /// A single account.
    Account(Address),
    /// Every unexpired member of a group.
    Group(GroupId),
}

impl Principal {
    /// Stable index encoding: tag byte plus 32 bytes of identity.
    pub fn index_bytes(&self) -> [u8; 33] {
        let mut out = [0u8; 33];
        match self {
            Principal::Account(addr) => {
                out[0] = 0x01;
                out[1..21].copy_from_slice(addr.as_bytes());
            }
            Principal::Group(id) => {
                out[0] = 0x02;
                id.to_big_endian(&mut out[1..33]);
            }
        }
        out
    }

    /// True for group principals.
    pub fn is_group(&self) -> bool {
        matches!(self, Principal::Group(_))
    }
}

/// Resource kind a policy attaches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    /// A bucket.
    Bucket,
    /// An object.
    Object,
    /// A group.
    Group,
}

impl ResourceType {
    /// Stable key byte.
    pub fn key_byte(self) -> u8 {
        match self {
            ResourceType::Bucket => 0x01,
            ResourceType::Object => 0x02,
            ResourceType::Group => 0x03,
        }
    }
}

/// A policy's target resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Kind.
    pub resource_type: ResourceType,
    /// Entity id.
    pub resource_id: Uint,
}
