//! # Virtual-Group Ports
//!
//! `VirtualGroupApi` is the inbound port the storage engine consumes.
//! `StorageStatsApi` points the other way: the storage engine implements
//! it and the handle is late-bound after both services exist, which
//! breaks the construction cycle between the two.

use crate::domain::entities::{GlobalVirtualGroup, GvgFamily, VgParams};
use crate::domain::errors::VgError;
use shared_store::{Context, KvRead};
use shared_types::{FamilyId, GvgId, SpId};

/// What the virtual-group engine needs to know about buckets.
pub trait StorageStatsApi: Send + Sync {
    /// True while any bucket is still placed on the family.
    fn family_in_use(&self, store: &dyn KvRead, family_id: FamilyId) -> bool;
}

/// Operations the storage engine drives.
pub trait VirtualGroupApi: Send + Sync {
    /// Group by id.
    fn gvg(&self, store: &dyn KvRead, id: GvgId) -> Option<GlobalVirtualGroup>;

    /// Family by id.
    fn family(&self, store: &dyn KvRead, id: FamilyId) -> Option<GvgFamily>;

    /// Family a new bucket lands on. A nonzero `requested` id must exist
    /// and belong to `primary_sp_id`; zero picks the first family of the
    /// SP that can host buckets.
    fn family_for_new_bucket(
        &self,
        store: &dyn KvRead,
        primary_sp_id: SpId,
        requested: FamilyId,
    ) -> Result<GvgFamily, VgError>;

    /// Deterministic group choice for a new object's local group.
    fn pick_gvg_for_object(
        &self,
        store: &dyn KvRead,
        family_id: FamilyId,
    ) -> Result<GlobalVirtualGroup, VgError>;

    /// Adjust a group's stored size on seal/delete.
    fn add_stored_size(&self, ctx: &mut Context<'_>, gvg_id: GvgId, delta: i64)
        -> Result<(), VgError>;

    /// Current params.
    fn params(&self, store: &dyn KvRead) -> VgParams;
}
