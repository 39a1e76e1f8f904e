//! # Bucket Operations
//!
//! CreateBucket runs its fatal preconditions in a fixed order: approval
//! presence, SP availability, approval expiry, approval signature,
//! family placement, then the per-owner cap. Any failure rolls the
//! message back.

use super::{bump_counter, ensure_permission, StorageService};
use crate::approval::{check_approval, PrimarySpApproval};
use crate::domain::entities::{BucketInfo, InternalBucketInfo};
use crate::domain::errors::StorageError;
use crate::domain::names::validate_bucket_name;
use crate::domain::value_objects::{ActionType, BucketStatus, ResourceType};
use crate::events;
use crate::keys;
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{Address, BucketId, SourceType, Visibility};
use tracing::info;

/// CreateBucket message.
#[derive(Clone, Debug)]
pub struct CreateBucketMsg {
    /// Bucket owner.
    pub creator: Address,
    /// Globally unique DNS-compatible name.
    pub bucket_name: String,
    /// Read visibility.
    pub visibility: Visibility,
    /// Stream account paying fees; zero address defaults to the creator.
    pub payment_address: Address,
    /// Operator address of the chosen primary SP.
    pub primary_sp_address: Address,
    /// The SP's signed authorization.
    pub primary_sp_approval: Option<PrimarySpApproval>,
    /// The exact bytes the SP signed.
    pub approval_msg_bytes: Option<Vec<u8>>,
    /// Prepaid read quota in bytes.
    pub charged_read_quota: u64,
    /// Native or bridged origin.
    pub source_type: SourceType,
}

impl StorageService {
    /// Create a bucket.
    pub fn create_bucket(
        &self,
        ctx: &mut Context<'_>,
        msg: CreateBucketMsg,
    ) -> Result<BucketId, StorageError> {
        validate_bucket_name(&msg.bucket_name)?;
        if ctx.store.has(&keys::bucket_key(&msg.bucket_name)) {
            return Err(StorageError::BucketExists { name: msg.bucket_name });
        }

        // 1. Approval and its signed bytes must both be present; then
        // 2. the SP must be live with an approval address,
        // 3. the approval unexpired and 4. correctly signed.
        let sp = self
            .sp
            .sp_by_operator(&ctx.store, msg.primary_sp_address)
            .filter(|sp| sp.status.is_in_service() && !sp.approval.is_zero())
            .ok_or(StorageError::SpUnavailable { addr: msg.primary_sp_address })?;
        let approval = check_approval(
            ctx,
            &sp,
            msg.primary_sp_approval.as_ref(),
            msg.approval_msg_bytes.as_deref(),
        )?;

        // 5. A family must be able to host the bucket.
        let family = self.vg.family_for_new_bucket(
            &ctx.store,
            sp.id,
            approval.global_virtual_group_family_id,
        )?;

        // 6. Per-owner cap.
        let params = self.get_params(&ctx.store);
        let count: u64 = get_obj(&ctx.store, &keys::bucket_count_key(msg.creator)).unwrap_or(0);
        if count >= params.max_buckets_per_account {
            return Err(StorageError::MaxBucketLimit {
                current: count,
                limit: params.max_buckets_per_account,
            });
        }

        let payment_address =
            if msg.payment_address.is_zero() { msg.creator } else { msg.payment_address };
        if !self.payment.is_payment_account_usable(&ctx.store, payment_address, msg.creator) {
            return Err(StorageError::PaymentAccountNotUsable { addr: payment_address });
        }

        let id = self.next_uint(&mut ctx.store, keys::bucket_sequence_key());
        let bucket = BucketInfo {
            id,
            name: msg.bucket_name.clone(),
            owner: msg.creator,
            payment_address,
            primary_sp_address: msg.primary_sp_address,
            gvg_family_id: family.id,
            visibility: msg.visibility,
            charged_read_quota: msg.charged_read_quota,
            status: BucketStatus::Created,
            source_type: msg.source_type,
            created_at: ctx.block.time,
        };
        let internal = InternalBucketInfo {
            price_time: ctx.block.time,
            next_lvg_id: 1,
            last_quota_update_height: ctx.block.height,
            ..Default::default()
        };

        if bucket.charged_read_quota > 0 {
            let delta =
                self.read_flow_delta(&ctx.store, &bucket, internal.price_time, bucket.charged_read_quota as i128);
            self.apply_bucket_flows(ctx, &bucket, vec![delta])?;
        }

        put_obj(&mut ctx.store, keys::bucket_key(&bucket.name), &bucket);
        put_obj(&mut ctx.store, keys::bucket_id_index_key(id), &bucket.name);
        put_obj(&mut ctx.store, keys::internal_bucket_key(id), &internal);
        bump_counter(&mut ctx.store, keys::bucket_count_key(bucket.owner), 1);
        bump_counter(&mut ctx.store, keys::family_bucket_count_key(family.id), 1);

        info!(bucket = %bucket.name, id = %id, "bucket created");
        ctx.events.emit(events::create_bucket(&bucket));
        Ok(id)
    }

    /// Delete an empty bucket and refund its read fee.
    pub fn delete_bucket(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        bucket_name: &str,
    ) -> Result<(), StorageError> {
        let bucket = self
            .get_bucket(&ctx.store, bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: bucket_name.to_string() })?;
        ensure_permission(
            &ctx.store,
            operator,
            bucket.owner,
            ResourceType::Bucket,
            bucket.id,
            ActionType::DeleteBucket,
            ctx.block.time,
        )?;
        let internal = self
            .get_internal_bucket(&ctx.store, bucket.id)
            .unwrap_or_else(|| panic!("bucket {} missing internal info", bucket.name));
        if internal.object_count > 0
            || internal.local_virtual_groups.iter().any(|lvg| lvg.stored_size > 0)
        {
            return Err(StorageError::BucketNotEmpty { name: bucket.name });
        }

        self.uncharge_bucket(ctx, &bucket, &internal)?;
        self.purge_bucket(ctx, &bucket);
        ctx.events.emit(events::delete_bucket(bucket.id, &bucket.name, operator));
        Ok(())
    }

    /// Update the payment address and/or charged read quota.
    pub fn update_bucket_info(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        bucket_name: &str,
        new_payment_address: Option<Address>,
        new_charged_read_quota: Option<u64>,
    ) -> Result<(), StorageError> {
        let mut bucket = self
            .get_bucket(&ctx.store, bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: bucket_name.to_string() })?;
        ensure_permission(
            &ctx.store,
            operator,
            bucket.owner,
            ResourceType::Bucket,
            bucket.id,
            ActionType::UpdateBucketInfo,
            ctx.block.time,
        )?;
        let mut internal = self
            .get_internal_bucket(&ctx.store, bucket.id)
            .unwrap_or_else(|| panic!("bucket {} missing internal info", bucket.name));

        if let Some(quota) = new_charged_read_quota {
            let params = self.get_params(&ctx.store);
            let allowed_height =
                internal.last_quota_update_height + params.min_quota_update_interval;
            if ctx.block.height < allowed_height {
                return Err(StorageError::QuotaUpdateTooFrequent { allowed_height });
            }
            let delta = quota as i128 - bucket.charged_read_quota as i128;
            if delta != 0 {
                let flow = self.read_flow_delta(&ctx.store, &bucket, internal.price_time, delta);
                self.apply_bucket_flows(ctx, &bucket, vec![flow])?;
            }
            bucket.charged_read_quota = quota;
            internal.last_quota_update_height = ctx.block.height;
        }

        if let Some(new_payer) = new_payment_address {
            if new_payer != bucket.payment_address {
                if !self.payment.is_payment_account_usable(&ctx.store, new_payer, bucket.owner) {
                    return Err(StorageError::PaymentAccountNotUsable { addr: new_payer });
                }
                // Detach every flow from the old payer, reattach to the new.
                let flows = self.total_bucket_flows(&ctx.store, &bucket, &internal)?;
                let negated = flows
                    .iter()
                    .map(|f| mc_01_payment::OutFlowDelta { to: f.to, rate: -f.rate })
                    .collect();
                self.apply_bucket_flows(ctx, &bucket, negated)?;
                bucket.payment_address = new_payer;
                self.apply_bucket_flows(ctx, &bucket, flows)?;
            }
        }

        put_obj(&mut ctx.store, keys::bucket_key(&bucket.name), &bucket);
        put_obj(&mut ctx.store, keys::internal_bucket_key(bucket.id), &internal);
        ctx.events.emit(events::update_bucket_info(&bucket));
        Ok(())
    }

    /// Mark a bucket as mirror-pending; the bridge sends the syn packet.
    pub fn mirror_bucket(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        bucket_name: &str,
    ) -> Result<BucketId, StorageError> {
        let mut bucket = self
            .get_bucket(&ctx.store, bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: bucket_name.to_string() })?;
        if operator != bucket.owner {
            return Err(StorageError::AccessDenied { operator });
        }
        bucket.source_type = SourceType::MirrorPending;
        put_obj(&mut ctx.store, keys::bucket_key(&bucket.name), &bucket);
        Ok(bucket.id)
    }

    /// Resolve a pending mirror from the ack.
    pub fn ack_mirror_bucket(
        &self,
        ctx: &mut Context<'_>,
        id: BucketId,
        success: bool,
    ) -> Result<(), StorageError> {
        let name = self
            .get_bucket_name_by_id(&ctx.store, id)
            .ok_or(StorageError::BucketNotFound { name: id.to_string() })?;
        let mut bucket = self
            .get_bucket(&ctx.store, &name)
            .ok_or(StorageError::BucketNotFound { name })?;
        bucket.source_type =
            if success { SourceType::CrossChain } else { SourceType::Origin };
        put_obj(&mut ctx.store, keys::bucket_key(&bucket.name), &bucket);
        Ok(())
    }

    // =========================================================================
    // SHARED BUCKET HELPERS
    // =========================================================================

    /// All positive flow deltas the bucket currently pays for.
    pub(crate) fn total_bucket_flows(
        &self,
        store: &dyn shared_store::KvRead,
        bucket: &BucketInfo,
        internal: &InternalBucketInfo,
    ) -> Result<Vec<mc_01_payment::OutFlowDelta>, StorageError> {
        let mut flows = Vec::new();
        if bucket.charged_read_quota > 0 {
            flows.push(self.read_flow_delta(
                store,
                bucket,
                internal.price_time,
                bucket.charged_read_quota as i128,
            ));
        }
        for lvg in &internal.local_virtual_groups {
            if lvg.total_charge_size > 0 {
                flows.extend(self.object_flow_deltas(
                    store,
                    bucket,
                    lvg,
                    internal.price_time,
                    lvg.total_charge_size,
                    1,
                )?);
            }
        }
        Ok(flows)
    }

    /// Remove every flow the bucket pays for.
    pub(crate) fn uncharge_bucket(
        &self,
        ctx: &mut Context<'_>,
        bucket: &BucketInfo,
        internal: &InternalBucketInfo,
    ) -> Result<(), StorageError> {
        let flows = self.total_bucket_flows(&ctx.store, bucket, internal)?;
        let negated = flows
            .into_iter()
            .map(|f| mc_01_payment::OutFlowDelta { to: f.to, rate: -f.rate })
            .collect::<Vec<_>>();
        if !negated.is_empty() {
            self.apply_bucket_flows(ctx, bucket, negated)?;
        }
        Ok(())
    }

    /// Drop the bucket's keys, counters and attached policies.
    pub(crate) fn purge_bucket(&self, ctx: &mut Context<'_>, bucket: &BucketInfo) {
        ctx.store.delete(&keys::bucket_key(&bucket.name));
        ctx.store.delete(&keys::bucket_id_index_key(bucket.id));
        ctx.store.delete(&keys::internal_bucket_key(bucket.id));
        bump_counter(&mut ctx.store, keys::bucket_count_key(bucket.owner), -1);
        bump_counter(&mut ctx.store, keys::family_bucket_count_key(bucket.gvg_family_id), -1);
        self.remove_policies_for_resource(ctx, ResourceType::Bucket, bucket.id);
    }
}
