//! # Virtual-Group Entities

use serde::{Deserialize, Serialize};
use shared_types::{Address, Denom, FamilyId, GvgId, SpId};

/// A global virtual group: one primary plus the erasure-coded secondary
/// set, with a deposit and a virtual payment account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalVirtualGroup {
    /// Group id.
    pub id: GvgId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Primary SP.
    pub primary_sp_id: SpId,
    /// Ordered secondary SPs; length equals the EC redundancy count.
    pub secondary_sp_ids: Vec<SpId>,
    /// Total payload bytes stored in the group.
    pub stored_size: u64,
    /// Stream account receiving secondary storage fees.
    pub virtual_payment_address: Address,
    /// Deposit locked against stored size.
    pub total_deposit: u128,
}

impl GlobalVirtualGroup {
    /// True when no object payload lands in this group.
    pub fn is_empty(&self) -> bool {
        self.stored_size == 0
    }
}

/// A family: all GVGs sharing one primary SP, the unit of bucket
/// placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GvgFamily {
    /// Family id.
    pub id: FamilyId,
    /// Primary SP shared by all member groups.
    pub primary_sp_id: SpId,
    /// Stream account receiving primary storage and read fees.
    pub virtual_payment_address: Address,
    /// Member group ids.
    pub gvg_ids: Vec<GvgId>,
}

/// A pending swap-out reservation, written by the predecessor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutInfo {
    /// SP handing the group over.
    pub sp_id: SpId,
    /// SP taking it over.
    pub successor_sp_id: SpId,
}

/// A pending swap-in reservation, written by the successor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapInInfo {
    /// SP being replaced.
    pub target_sp_id: SpId,
    /// SP reserving the takeover.
    pub successor_sp_id: SpId,
    /// Unix seconds after which the reservation lapses.
    pub expiration_time: i64,
}

/// Governance parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VgParams {
    /// Deposit denomination (must match the SP deposit denom).
    pub deposit_denom: Denom,
    /// Deposit required per stored byte.
    pub gvg_staking_per_bytes: u128,
    /// Groups one family may hold.
    pub max_gvg_per_family: u32,
    /// Seconds a swap-in reservation stays valid.
    pub swap_in_validity_period: u64,
}

impl Default for VgParams {
    fn default() -> Self {
        Self {
            deposit_denom: "umoca".to_string(),
            gvg_staking_per_bytes: 16,
            max_gvg_per_family: 10,
            swap_in_validity_period: 60 * 60 * 24,
        }
    }
}
