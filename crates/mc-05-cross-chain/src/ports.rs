//! # Bridge Ports
//!
//! The channel apps reach the storage engine through this narrowed
//! port; tests substitute recorders to assert exactly what a decoded
//! packet drives into the keeper.

use shared_store::Context;
use shared_types::{Address, Uint};

/// A decoded create-bucket request handed to the storage engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeCreateBucket {
    /// Bucket owner.
    pub creator: Address,
    /// Bucket name.
    pub bucket_name: String,
    /// Stream account paying fees (zero → creator).
    pub payment_address: Address,
    /// Primary SP operator address.
    pub primary_sp_address: Address,
    /// Approval expiry height.
    pub expired_height: u64,
    /// 65-byte approval signature.
    pub approval_sig: Vec<u8>,
    /// The bytes the SP signed.
    pub approval_msg_bytes: Vec<u8>,
    /// Prepaid read quota.
    pub charged_read_quota: u64,
    /// Family id bound by the approval (0 lets the engine pick; only
    /// V2 packets carry a nonzero value).
    pub global_virtual_group_family_id: u32,
}

/// A decoded policy write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgePolicy {
    /// Acting account.
    pub operator: Address,
    /// 0x01 account, 0x02 group.
    pub principal_type: u8,
    /// Account address (left-padded) or group id.
    pub principal_value: [u8; 32],
    /// Resource kind byte (0x01 bucket, 0x02 object, 0x03 group).
    pub resource_type: u8,
    /// Resource id.
    pub resource_id: Uint,
    /// Action byte.
    pub action: u8,
    /// 0 allow, 1 deny.
    pub effect: u8,
    /// Unix seconds; 0 = never expires.
    pub expiration_time: u64,
}

/// Everything the channels drive into the storage engine.
pub trait StorageBridgeApi: Send + Sync {
    /// Create a bucket from an inbound packet. Approval preconditions
    /// apply exactly as for a native CreateBucket.
    fn create_bucket(&self, ctx: &mut Context<'_>, msg: BridgeCreateBucket)
        -> Result<Uint, String>;

    /// Delete a bucket by id.
    fn delete_bucket(&self, ctx: &mut Context<'_>, operator: Address, id: Uint)
        -> Result<(), String>;

    /// Resolve a pending bucket mirror.
    fn ack_mirror_bucket(&self, ctx: &mut Context<'_>, id: Uint, success: bool)
        -> Result<(), String>;

    /// Delete an object by id.
    fn delete_object(&self, ctx: &mut Context<'_>, operator: Address, id: Uint)
        -> Result<(), String>;

    /// Resolve a pending object mirror.
    fn ack_mirror_object(&self, ctx: &mut Context<'_>, id: Uint, success: bool)
        -> Result<(), String>;

    /// Create a group.
    fn create_group(&self, ctx: &mut Context<'_>, owner: Address, name: &str)
        -> Result<Uint, String>;

    /// Delete a group by id.
    fn delete_group(&self, ctx: &mut Context<'_>, operator: Address, id: Uint)
        -> Result<(), String>;

    /// Write a policy.
    fn put_policy(&self, ctx: &mut Context<'_>, policy: BridgePolicy) -> Result<Uint, String>;

    /// Remove a policy.
    fn delete_policy(&self, ctx: &mut Context<'_>, policy: BridgePolicy) -> Result<(), String>;
}
