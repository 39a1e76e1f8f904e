//! # Storage Errors
//!
//! Ordered roughly by the taxonomy: validation, approval, authorization,
//! limits, payment, then state conflicts. Every variant is fatal to its
//! message; the cache context rolls the message back.

use shared_types::Address;
use thiserror::Error;

/// Storage failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    // -- validation ----------------------------------------------------------
    /// Bucket name violates the DNS-compatible 3–63 char rule.
    #[error("invalid bucket name: {name}")]
    InvalidBucketName {
        /// Offending name.
        name: String,
    },

    /// Object name empty or oversized.
    #[error("invalid object name")]
    InvalidObjectName,

    /// Group name empty or oversized.
    #[error("invalid group name")]
    InvalidGroupName,

    // -- approval ------------------------------------------------------------
    /// Approval or its signed message bytes are missing.
    #[error("approval is nil")]
    MissingApproval,

    /// Approval expired at an earlier block height.
    #[error("approval expired: expired at {expired_height}, current {current_height}")]
    ApprovalExpired {
        /// Height the approval lapsed.
        expired_height: u64,
        /// Current height.
        current_height: u64,
    },

    /// Approval signature does not recover to the SP approval address.
    #[error("invalid approval signature")]
    InvalidApproval,

    /// SP missing, not in service, or without an approval address.
    #[error("storage provider unavailable: {addr}")]
    SpUnavailable {
        /// Queried operator address.
        addr: Address,
    },

    // -- authorization -------------------------------------------------------
    /// Operator lacks permission for the action.
    #[error("access denied for {operator}")]
    AccessDenied {
        /// The operator.
        operator: Address,
    },

    // -- limits --------------------------------------------------------------
    /// Owner hit the bucket cap.
    #[error("max bucket limit exceeded: {current}/{limit}")]
    MaxBucketLimit {
        /// Current count.
        current: u64,
        /// Configured cap.
        limit: u64,
    },

    /// Group member cap exceeded.
    #[error("max group member limit exceeded: {current}/{limit}")]
    MaxGroupMembers {
        /// Current count.
        current: u64,
        /// Configured cap.
        limit: u64,
    },

    /// Policy statement cap exceeded.
    #[error("max statements exceeded: {got}/{limit}")]
    MaxStatements {
        /// Supplied count.
        got: u32,
        /// Configured cap.
        limit: u32,
    },

    /// Bucket would exceed its local group fan-out cap.
    #[error("max local virtual group limit exceeded: {current}/{limit}")]
    MaxLocalVirtualGroups {
        /// Current count.
        current: u32,
        /// Configured cap.
        limit: u32,
    },

    /// Discontinue rate limit hit for the window.
    #[error("discontinue limit exceeded: {requested} requested, {remaining} remaining in window")]
    DiscontinueLimit {
        /// Requested in this call.
        requested: u64,
        /// Remaining budget in the window.
        remaining: u64,
    },

    /// Charged read quota changed too soon.
    #[error("quota updated too frequently: wait until height {allowed_height}")]
    QuotaUpdateTooFrequent {
        /// First height another change is allowed.
        allowed_height: u64,
    },

    // -- payment / placement -------------------------------------------------
    /// Underlying payment failure (fee charge, refund).
    #[error("payment: {0}")]
    Payment(#[from] mc_01_payment::PaymentError),

    /// Underlying virtual-group failure (placement).
    #[error("virtual group: {0}")]
    VirtualGroup(#[from] mc_03_virtual_group::VgError),

    /// Payment address not usable by the operator.
    #[error("payment account {addr} not usable")]
    PaymentAccountNotUsable {
        /// The account.
        addr: Address,
    },

    // -- state ---------------------------------------------------------------
    /// Bucket name already taken.
    #[error("bucket already exists: {name}")]
    BucketExists {
        /// The name.
        name: String,
    },

    /// Bucket not found.
    #[error("bucket not found: {name}")]
    BucketNotFound {
        /// The name.
        name: String,
    },

    /// Bucket still holds objects.
    #[error("bucket not empty: {name}")]
    BucketNotEmpty {
        /// The name.
        name: String,
    },

    /// Bucket is discontinued or migrating.
    #[error("bucket {name} is not available")]
    BucketUnavailable {
        /// The name.
        name: String,
    },

    /// Object already exists under the name.
    #[error("object already exists: {name}")]
    ObjectExists {
        /// The name.
        name: String,
    },

    /// Object not found.
    #[error("object not found: {name}")]
    ObjectNotFound {
        /// The name.
        name: String,
    },

    /// Object status does not admit the operation.
    #[error("invalid object status for {name}")]
    InvalidObjectStatus {
        /// The name.
        name: String,
    },

    /// Seal signature rejected by the aggregate BLS check.
    #[error("invalid seal signature")]
    InvalidSealSignature,

    /// Group already exists under (owner, name).
    #[error("group already exists: {name}")]
    GroupExists {
        /// The name.
        name: String,
    },

    /// Group not found.
    #[error("group not found")]
    GroupNotFound,

    /// Policy not found.
    #[error("policy not found")]
    PolicyNotFound,

    /// Policy resource does not exist.
    #[error("policy resource not found")]
    ResourceNotFound,

    /// The ERC-721 twin call failed; the enclosing delete/seal aborts.
    #[error("object nft call failed: {reason}")]
    NftCallFailed {
        /// EVM-side reason.
        reason: String,
    },
}
