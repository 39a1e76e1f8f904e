//! # Storage Service
//!
//! Split by entity: `bucket`, `object`, `group`, `policy`, plus the
//! end-block `gc` pass. This module holds the service struct, params,
//! versioned-params lookup and the stream-fee charging helpers shared by
//! all of them.

pub mod bucket;
pub mod gc;
pub mod group;
pub mod object;
pub mod policy;

#[cfg(test)]
mod tests;

use crate::domain::entities::{
    BucketInfo, InternalBucketInfo, LocalVirtualGroup, ObjectInfo, StorageParams, VersionedParams,
};
use crate::domain::errors::StorageError;
use crate::keys;
use crate::ports::ObjectNftApi;
use mc_01_payment::{OutFlowDelta, PaymentApi, UserFlows};
use mc_02_sp_registry::{GlobalSpStorePrice, SpApi};
use mc_03_virtual_group::{StorageStatsApi, VirtualGroupApi};
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{Address, FamilyId};
use std::sync::Arc;

/// The storage engine.
pub struct StorageService {
    pub(crate) payment: Arc<dyn PaymentApi>,
    pub(crate) sp: Arc<dyn SpApi>,
    pub(crate) vg: Arc<dyn VirtualGroupApi>,
    pub(crate) nft: Arc<dyn ObjectNftApi>,
}

impl StorageService {
    /// Build over the payment, SP, virtual-group and NFT ports.
    pub fn new(
        payment: Arc<dyn PaymentApi>,
        sp: Arc<dyn SpApi>,
        vg: Arc<dyn VirtualGroupApi>,
        nft: Arc<dyn ObjectNftApi>,
    ) -> Self {
        Self { payment, sp, vg, nft }
    }

    /// Current governance params.
    pub fn get_params(&self, store: &dyn KvRead) -> StorageParams {
        get_obj(store, &keys::params_key()).unwrap_or_default()
    }

    /// Overwrite governance params.
    pub fn set_params(&self, store: &mut dyn KvWrite, params: &StorageParams) {
        put_obj(store, keys::params_key(), params);
    }

    // =========================================================================
    // VERSIONED PARAMS
    // =========================================================================

    /// Append a new params version. Versions are immutable once written.
    pub fn append_versioned_params(&self, store: &mut dyn KvWrite, params: &VersionedParams) {
        put_obj(store, keys::versioned_params_key(params.timestamp), params);
    }

    /// Version effective at `time`: greatest timestamp ≤ `time`, or the
    /// built-in defaults when none was written yet.
    pub fn versioned_params_at(&self, store: &dyn KvRead, time: i64) -> VersionedParams {
        let mut selected = VersionedParams::default();
        for (_, bytes) in store.scan_prefix(&keys::versioned_params_prefix()) {
            let version: VersionedParams = bincode::deserialize(&bytes)
                .unwrap_or_else(|e| panic!("corrupt versioned params: {e}"));
            if version.timestamp <= time {
                selected = version;
            } else {
                break;
            }
        }
        selected
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Bucket by name.
    pub fn get_bucket(&self, store: &dyn KvRead, name: &str) -> Option<BucketInfo> {
        get_obj(store, &keys::bucket_key(name))
    }

    /// Bucket name by id.
    pub fn get_bucket_name_by_id(
        &self,
        store: &dyn KvRead,
        id: shared_types::BucketId,
    ) -> Option<String> {
        get_obj(store, &keys::bucket_id_index_key(id))
    }

    /// Charging state for a bucket.
    pub fn get_internal_bucket(
        &self,
        store: &dyn KvRead,
        id: shared_types::BucketId,
    ) -> Option<InternalBucketInfo> {
        get_obj(store, &keys::internal_bucket_key(id))
    }

    /// Object by `(bucket, name)`.
    pub fn get_object(
        &self,
        store: &dyn KvRead,
        bucket_name: &str,
        object_name: &str,
    ) -> Option<ObjectInfo> {
        get_obj(store, &keys::object_key(bucket_name, object_name))
    }

    /// Natural key by object id.
    pub fn get_object_key_by_id(
        &self,
        store: &dyn KvRead,
        id: shared_types::ObjectId,
    ) -> Option<(String, String)> {
        get_obj(store, &keys::object_id_index_key(id))
    }

    // =========================================================================
    // CHARGING
    // =========================================================================

    /// Chargeable size of a payload under the params at the bucket's
    /// price time. Zero payload charges nothing.
    pub(crate) fn charge_size(&self, store: &dyn KvRead, price_time: i64, payload: u64) -> u64 {
        if payload == 0 {
            return 0;
        }
        let params = self.versioned_params_at(store, price_time);
        payload.max(params.min_charge_size)
    }

    /// Global price snapshot at the bucket's price time. Missing prices
    /// are a wiring error: storage cannot charge without an SP price.
    pub(crate) fn prices_at(&self, store: &dyn KvRead, price_time: i64) -> GlobalSpStorePrice {
        self.sp
            .global_price_at(store, price_time)
            .unwrap_or_else(|| panic!("no global sp price at {price_time}"))
    }

    /// Flow deltas for one object's charge size: primary share to the
    /// family account, secondary share to the group account. `sign` is
    /// +1 to charge, -1 to refund.
    pub(crate) fn object_flow_deltas(
        &self,
        store: &dyn KvRead,
        bucket: &BucketInfo,
        lvg: &LocalVirtualGroup,
        price_time: i64,
        charge: u64,
        sign: i128,
    ) -> Result<Vec<OutFlowDelta>, StorageError> {
        let prices = self.prices_at(store, price_time);
        let family = self
            .vg
            .family(store, bucket.gvg_family_id)
            .unwrap_or_else(|| panic!("bucket family {} missing", bucket.gvg_family_id));
        let gvg = self
            .vg
            .gvg(store, lvg.gvg_id)
            .unwrap_or_else(|| panic!("lvg gvg {} missing", lvg.gvg_id));
        Ok(vec![
            OutFlowDelta {
                to: family.virtual_payment_address,
                rate: sign * (prices.primary_store_price * charge as u128) as i128,
            },
            OutFlowDelta {
                to: gvg.virtual_payment_address,
                rate: sign * (prices.secondary_store_price * charge as u128) as i128,
            },
        ])
    }

    /// Flow delta for the bucket's prepaid read quota.
    pub(crate) fn read_flow_delta(
        &self,
        store: &dyn KvRead,
        bucket: &BucketInfo,
        price_time: i64,
        quota_delta: i128,
    ) -> OutFlowDelta {
        let prices = self.prices_at(store, price_time);
        let family = self
            .vg
            .family(store, bucket.gvg_family_id)
            .unwrap_or_else(|| panic!("bucket family {} missing", bucket.gvg_family_id));
        OutFlowDelta {
            to: family.virtual_payment_address,
            rate: quota_delta * prices.read_price as i128,
        }
    }

    /// Apply flow deltas from the bucket's payment account.
    pub(crate) fn apply_bucket_flows(
        &self,
        ctx: &mut Context<'_>,
        bucket: &BucketInfo,
        flows: Vec<OutFlowDelta>,
    ) -> Result<(), StorageError> {
        self.payment
            .apply_user_flows(ctx, UserFlows { from: bucket.payment_address, flows })?;
        Ok(())
    }

    pub(crate) fn next_uint(&self, store: &mut dyn KvWrite, sequence_key: Vec<u8>) -> shared_types::Uint {
        let next: u64 = get_obj(store, &sequence_key).unwrap_or(1);
        put_obj(store, sequence_key, &(next + 1));
        shared_types::Uint::from(next)
    }
}

impl StorageStatsApi for StorageService {
    fn family_in_use(&self, store: &dyn KvRead, family_id: FamilyId) -> bool {
        get_obj::<u64>(store, &keys::family_bucket_count_key(family_id))
            .map(|count| count > 0)
            .unwrap_or(false)
    }
}

pub(crate) fn bump_counter(store: &mut dyn KvWrite, key: Vec<u8>, delta: i64) -> u64 {
    let current: u64 = get_obj(store, &key).unwrap_or(0);
    let next = (current as i64 + delta).max(0) as u64;
    if next == 0 {
        store.delete(&key);
    } else {
        put_obj(store, key, &next);
    }
    next
}

/// Look up an account's permission over a bucket-held resource.
pub(crate) fn ensure_permission(
    store: &dyn KvRead,
    operator: Address,
    owner: Address,
    resource_type: crate::domain::value_objects::ResourceType,
    resource_id: shared_types::Uint,
    action: crate::domain::value_objects::ActionType,
    now: i64,
) -> Result<(), StorageError> {
    if crate::permission::verify_permission(
        store,
        operator,
        owner,
        resource_type,
        resource_id,
        action,
        now,
    ) {
        Ok(())
    } else {
        Err(StorageError::AccessDenied { operator })
    }
}
