//! # Virtual-Group Errors

use shared_types::{FamilyId, GvgId, SpId};
use thiserror::Error;

/// Virtual-group failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VgError {
    /// Caller is not a registered SP.
    #[error("storage provider not found")]
    SpNotFound,

    /// SP exists but is not `IN_SERVICE`.
    #[error("storage provider {sp_id} not in service")]
    SpNotInService {
        /// The SP.
        sp_id: SpId,
    },

    /// Family id does not exist.
    #[error("global virtual group family {family_id} not found")]
    FamilyNotFound {
        /// The family.
        family_id: FamilyId,
    },

    /// Family belongs to a different primary SP.
    #[error("family {family_id} primary mismatch")]
    FamilyPrimaryMismatch {
        /// The family.
        family_id: FamilyId,
    },

    /// Group id does not exist.
    #[error("global virtual group {gvg_id} not found")]
    GvgNotFound {
        /// The group.
        gvg_id: GvgId,
    },

    /// Group still stores payload.
    #[error("global virtual group {gvg_id} not empty")]
    GvgNotEmpty {
        /// The group.
        gvg_id: GvgId,
    },

    /// A secondary repeats or equals the primary.
    #[error("invalid secondary sp set")]
    InvalidSecondarySet,

    /// Swap calls accept between 1 and 50 group ids.
    #[error("invalid gvg id count: {got}")]
    InvalidGvgCount {
        /// Supplied count.
        got: usize,
    },

    /// Caller is not the group's primary SP.
    #[error("sp is not primary of gvg {gvg_id}")]
    NotPrimary {
        /// The group.
        gvg_id: GvgId,
    },

    /// No reservation for the group.
    #[error("swap info not found for gvg {gvg_id}")]
    SwapInfoNotFound {
        /// The group.
        gvg_id: GvgId,
    },

    /// Reservation belongs to a different successor.
    #[error("swap successor mismatch")]
    SwapSuccessorMismatch,

    /// A live reservation already exists.
    #[error("swap info already exists")]
    SwapInfoExists,

    /// Successor approval expired.
    #[error("successor approval expired")]
    ApprovalExpired,

    /// Successor approval signature invalid.
    #[error("invalid successor approval")]
    InvalidApproval,

    /// Deposit denom does not match the SP deposit denom.
    #[error("invalid deposit denom: {got}")]
    DepositDenomMismatch {
        /// Offered denom.
        got: String,
    },

    /// Funding account cannot cover the deposit.
    #[error("insufficient funding for deposit")]
    InsufficientFunding,

    /// Family reached its group cap.
    #[error("family {family_id} gvg limit reached: {current}/{limit}")]
    FamilyGvgLimit {
        /// The family.
        family_id: FamilyId,
        /// Current count.
        current: u32,
        /// Configured cap.
        limit: u32,
    },

    /// SP still owns groups or families; exit cannot complete.
    #[error("storage provider {sp_id} not drained")]
    SpNotDrained {
        /// The SP.
        sp_id: SpId,
    },

    /// No family of the primary SP can host a new bucket.
    #[error("no available family for sp {sp_id}")]
    NoAvailableFamily {
        /// The primary SP.
        sp_id: SpId,
    },

    /// Underlying SP registry failure.
    #[error("sp registry: {0}")]
    Registry(String),
}
