//! # Discontinue and GC
//!
//! Discontinue is a soft delete: the entity keeps a saved original
//! status and a deletion entry scheduled `discontinue_confirm_period`
//! blocks out. The end-blocker drains deletion entries and expired
//! policies under per-block budgets.

use super::StorageService;
use crate::domain::errors::StorageError;
use crate::domain::value_objects::{BucketStatus, ObjectStatus};
use crate::events;
use crate::keys;
use serde::{Deserialize, Serialize};
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{Address, PolicyId, Uint};
use tracing::debug;

const KIND_OBJECT: u8 = 0x01;
const KIND_BUCKET: u8 = 0x02;

/// Per-account rate-limit window for discontinue calls.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
struct DiscontinueWindow {
    window_start: u64,
    count: u64,
}

impl StorageService {
    fn take_discontinue_budget(
        &self,
        ctx: &mut Context<'_>,
        kind: u8,
        account: Address,
        requested: u64,
        window_blocks: u64,
        max: u64,
    ) -> Result<(), StorageError> {
        let key = keys::discontinue_count_key(kind, account);
        let mut window: DiscontinueWindow = get_obj(&ctx.store, &key).unwrap_or_default();
        if ctx.block.height >= window.window_start + window_blocks {
            window = DiscontinueWindow { window_start: ctx.block.height, count: 0 };
        }
        let remaining = max.saturating_sub(window.count);
        if requested > remaining {
            return Err(StorageError::DiscontinueLimit { requested, remaining });
        }
        window.count += requested;
        put_obj(&mut ctx.store, key, &window);
        Ok(())
    }

    /// Soft-delete objects; only the bucket's primary SP gc address may.
    pub fn discontinue_objects(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        bucket_name: &str,
        object_names: &[String],
    ) -> Result<(), StorageError> {
        let bucket = self
            .get_bucket(&ctx.store, bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: bucket_name.to_string() })?;
        let sp = self
            .sp
            .sp_by_operator(&ctx.store, bucket.primary_sp_address)
            .ok_or(StorageError::SpUnavailable { addr: bucket.primary_sp_address })?;
        if operator != sp.gc {
            return Err(StorageError::AccessDenied { operator });
        }
        let params = self.get_params(&ctx.store);
        self.take_discontinue_budget(
            ctx,
            KIND_OBJECT,
            operator,
            object_names.len() as u64,
            params.discontinue_counting_window,
            params.discontinue_object_max,
        )?;

        let delete_at = ctx.block.height + params.discontinue_confirm_period;
        for object_name in object_names {
            let mut object = self
                .get_object(&ctx.store, bucket_name, object_name)
                .ok_or_else(|| StorageError::ObjectNotFound { name: object_name.clone() })?;
            if !matches!(object.status, ObjectStatus::Created | ObjectStatus::Sealed) {
                return Err(StorageError::InvalidObjectStatus { name: object.name });
            }
            put_obj(&mut ctx.store, keys::original_status_key(object.id), &object.status);
            object.status = ObjectStatus::Discontinued;
            put_obj(&mut ctx.store, keys::object_key(bucket_name, object_name), &object);
            put_obj(
                &mut ctx.store,
                keys::object_delete_key(delete_at, object.id),
                &(bucket_name.to_string(), object_name.clone()),
            );
            ctx.events.emit(events::discontinue("object", object.id.to_string(), delete_at));
        }
        Ok(())
    }

    /// Soft-delete a bucket and everything in it.
    pub fn discontinue_bucket(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        bucket_name: &str,
    ) -> Result<(), StorageError> {
        let mut bucket = self
            .get_bucket(&ctx.store, bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: bucket_name.to_string() })?;
        let sp = self
            .sp
            .sp_by_operator(&ctx.store, bucket.primary_sp_address)
            .ok_or(StorageError::SpUnavailable { addr: bucket.primary_sp_address })?;
        if operator != sp.gc {
            return Err(StorageError::AccessDenied { operator });
        }
        if bucket.status != BucketStatus::Created {
            return Err(StorageError::BucketUnavailable { name: bucket.name });
        }
        let params = self.get_params(&ctx.store);
        self.take_discontinue_budget(
            ctx,
            KIND_BUCKET,
            operator,
            1,
            params.discontinue_counting_window,
            params.discontinue_bucket_max,
        )?;

        let delete_at = ctx.block.height + params.discontinue_confirm_period;
        bucket.status = BucketStatus::Discontinued;
        put_obj(&mut ctx.store, keys::bucket_key(&bucket.name), &bucket);
        put_obj(&mut ctx.store, keys::bucket_delete_key(delete_at, bucket.id), &bucket.name);
        ctx.events.emit(events::discontinue("bucket", bucket.id.to_string(), delete_at));
        Ok(())
    }

    /// End-block pass: forced deletions up to `discontinue_deletion_max`,
    /// then expired-policy GC up to `stale_policy_cleanup_max`. Runs with
    /// the force-update flag so refunds reach frozen payers.
    pub fn end_blocker(&self, ctx: &mut Context<'_>) {
        let prev_force = ctx.force_update;
        ctx.force_update = true;
        self.run_forced_deletions(ctx);
        ctx.force_update = prev_force;
        self.gc_expired_policies(ctx);
    }

    fn run_forced_deletions(&self, ctx: &mut Context<'_>) {
        let params = self.get_params(&ctx.store);
        let mut budget = params.discontinue_deletion_max;

        for (key, bytes) in ctx.store.scan_prefix(&keys::object_delete_prefix()) {
            if keys::delete_key_height(&key) > ctx.block.height || budget == 0 {
                break;
            }
            let (bucket_name, object_name): (String, String) = bincode::deserialize(&bytes)
                .unwrap_or_else(|e| panic!("corrupt delete queue entry: {e}"));
            ctx.store.delete(&key);
            self.force_delete_object(ctx, &bucket_name, &object_name)
                .unwrap_or_else(|e| panic!("forced object deletion failed: {e}"));
            budget -= 1;
        }

        for (key, bytes) in ctx.store.scan_prefix(&keys::bucket_delete_prefix()) {
            if keys::delete_key_height(&key) > ctx.block.height || budget == 0 {
                break;
            }
            let bucket_name: String = bincode::deserialize(&bytes)
                .unwrap_or_else(|e| panic!("corrupt delete queue entry: {e}"));
            let Some(bucket) = self.get_bucket(&ctx.store, &bucket_name) else {
                ctx.store.delete(&key);
                continue;
            };

            let mut drained = true;
            for (_, object_bytes) in
                ctx.store.scan_prefix(&keys::object_bucket_prefix(&bucket_name))
            {
                if budget == 0 {
                    drained = false;
                    break;
                }
                let object: crate::domain::entities::ObjectInfo =
                    bincode::deserialize(&object_bytes)
                        .unwrap_or_else(|e| panic!("corrupt object: {e}"));
                self.force_delete_object(ctx, &bucket_name, &object.name)
                    .unwrap_or_else(|e| panic!("forced object deletion failed: {e}"));
                budget -= 1;
            }
            if drained {
                let internal = self
                    .get_internal_bucket(&ctx.store, bucket.id)
                    .unwrap_or_else(|| panic!("bucket {} missing internal info", bucket.name));
                self.uncharge_bucket(ctx, &bucket, &internal)
                    .unwrap_or_else(|e| panic!("bucket uncharge failed: {e}"));
                self.purge_bucket(ctx, &bucket);
                ctx.store.delete(&key);
                ctx.events.emit(events::delete_bucket(bucket.id, &bucket.name, Address::ZERO));
                debug!(bucket = %bucket.name, "discontinued bucket removed");
            }
            // Budget exhausted mid-bucket: the entry stays queued and the
            // next block resumes the drain.
        }
    }

    fn gc_expired_policies(&self, ctx: &mut Context<'_>) {
        let params = self.get_params(&ctx.store);
        let mut removed: u64 = 0;
        for (key, _) in ctx.store.scan_prefix(&keys::policy_expiration_prefix()) {
            let expiration = i64::from_be_bytes(
                key[2..10].try_into().unwrap_or_else(|_| panic!("malformed expiration key")),
            );
            if expiration > ctx.block.time || removed >= params.stale_policy_cleanup_max {
                break;
            }
            let id = Uint::from_big_endian(&key[10..42]);
            ctx.store.delete(&key);
            self.remove_expired_policy(ctx, id);
            removed += 1;
        }
    }

    fn remove_expired_policy(&self, ctx: &mut Context<'_>, id: PolicyId) {
        let Some(policy) =
            get_obj::<crate::domain::entities::Policy>(&ctx.store, &keys::policy_key(id))
        else {
            return;
        };
        let index_key = keys::policy_index_key(
            policy.resource.resource_type,
            policy.resource.resource_id,
            &policy.principal,
        );
        ctx.store.delete(&keys::policy_key(id));
        ctx.store.delete(&index_key);
        ctx.events.emit(events::delete_policy(id));
    }
}
