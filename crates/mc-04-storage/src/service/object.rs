//! # Object Operations
//!
//! The NFT-twin rules live here and are deliberately narrow:
//!
//! - an empty object (payload 0) seals at creation and never mints
//! - a non-empty seal mints exactly one twin
//! - deletion burns iff the object's original status was SEALED and its
//!   payload is non-zero; a failed burn aborts the delete
//! - forced deletion consults the status saved when the object was
//!   discontinued, not the DISCONTINUED marker itself

use super::{bump_counter, ensure_permission, StorageService};
use crate::approval::{check_approval, PrimarySpApproval};
use crate::domain::entities::{BucketInfo, InternalBucketInfo, LocalVirtualGroup, ObjectInfo};
use crate::domain::errors::StorageError;
use crate::domain::names::validate_object_name;
use crate::domain::value_objects::{ActionType, BucketStatus, ObjectStatus, ResourceType};
use crate::events;
use crate::keys;
use shared_crypto::{verify_bls_aggregate, BlsSignature};
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{Address, Hash, ObjectId, SourceType, Visibility};

/// CreateObject message.
#[derive(Clone, Debug)]
pub struct CreateObjectMsg {
    /// Caller.
    pub operator: Address,
    /// Target bucket.
    pub bucket_name: String,
    /// Object name, unique within the bucket.
    pub object_name: String,
    /// Payload size in bytes.
    pub payload_size: u64,
    /// Segment checksums.
    pub checksums: Vec<Hash>,
    /// Read visibility.
    pub visibility: Visibility,
    /// Native or bridged origin.
    pub source_type: SourceType,
}

/// CopyObject message; approval preconditions match CreateBucket.
#[derive(Clone, Debug)]
pub struct CopyObjectMsg {
    /// Caller.
    pub operator: Address,
    /// Source bucket.
    pub src_bucket_name: String,
    /// Source object.
    pub src_object_name: String,
    /// Destination bucket.
    pub dst_bucket_name: String,
    /// Destination object name.
    pub dst_object_name: String,
    /// Destination primary SP's approval.
    pub dst_primary_sp_approval: Option<PrimarySpApproval>,
    /// The exact bytes the SP signed.
    pub approval_msg_bytes: Option<Vec<u8>>,
}

/// Message the secondary SPs co-sign for a seal.
pub fn seal_digest(bucket: &BucketInfo, object: &ObjectInfo) -> Vec<u8> {
    let mut message = Vec::with_capacity(64 + object.checksums.len() * 32);
    let mut id_bytes = [0u8; 32];
    bucket.id.to_big_endian(&mut id_bytes);
    message.extend_from_slice(&id_bytes);
    object.id.to_big_endian(&mut id_bytes);
    message.extend_from_slice(&id_bytes);
    for checksum in &object.checksums {
        message.extend_from_slice(checksum);
    }
    message
}

impl StorageService {
    /// Create an object. Empty payloads seal immediately without a twin.
    pub fn create_object(
        &self,
        ctx: &mut Context<'_>,
        msg: CreateObjectMsg,
    ) -> Result<ObjectId, StorageError> {
        validate_object_name(&msg.object_name)?;
        let bucket = self
            .get_bucket(&ctx.store, &msg.bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: msg.bucket_name.clone() })?;
        if bucket.status != BucketStatus::Created {
            return Err(StorageError::BucketUnavailable { name: bucket.name });
        }
        ensure_permission(
            &ctx.store,
            msg.operator,
            bucket.owner,
            ResourceType::Bucket,
            bucket.id,
            ActionType::CreateObject,
            ctx.block.time,
        )?;
        if ctx.store.has(&keys::object_key(&msg.bucket_name, &msg.object_name)) {
            return Err(StorageError::ObjectExists { name: msg.object_name });
        }
        let mut internal = self
            .get_internal_bucket(&ctx.store, bucket.id)
            .unwrap_or_else(|| panic!("bucket {} missing internal info", bucket.name));

        let id = self.next_uint(&mut ctx.store, keys::object_sequence_key());
        let mut object = ObjectInfo {
            id,
            bucket_name: bucket.name.clone(),
            name: msg.object_name.clone(),
            owner: bucket.owner,
            payload_size: msg.payload_size,
            checksums: msg.checksums,
            status: ObjectStatus::Created,
            lvg_id: 0,
            created_at: ctx.block.time,
            updated_at: ctx.block.time,
            source_type: msg.source_type,
            visibility: msg.visibility,
        };

        if msg.payload_size == 0 {
            // Empty object: sealed at creation, never minted.
            object.status = ObjectStatus::Sealed;
        } else {
            let lvg_id = self.land_object(ctx, &bucket, &mut internal, msg.payload_size)?;
            object.lvg_id = lvg_id;
        }

        put_obj(&mut ctx.store, keys::object_key(&object.bucket_name, &object.name), &object);
        put_obj(
            &mut ctx.store,
            keys::object_id_index_key(id),
            &(object.bucket_name.clone(), object.name.clone()),
        );
        internal.object_count += 1;
        put_obj(&mut ctx.store, keys::internal_bucket_key(bucket.id), &internal);
        ctx.events.emit(events::create_object(&object));
        Ok(id)
    }

    /// Pick a local group for a payload and charge its store fee.
    /// Returns the local group id.
    fn land_object(
        &self,
        ctx: &mut Context<'_>,
        bucket: &BucketInfo,
        internal: &mut InternalBucketInfo,
        payload_size: u64,
    ) -> Result<u32, StorageError> {
        let gvg = self.vg.pick_gvg_for_object(&ctx.store, bucket.gvg_family_id)?;
        let params = self.get_params(&ctx.store);

        let lvg_index = internal.local_virtual_groups.iter().position(|lvg| lvg.gvg_id == gvg.id);
        let lvg_index = match lvg_index {
            Some(index) => index,
            None => {
                let current = internal.local_virtual_groups.len() as u32;
                if current >= params.max_local_virtual_group_num_per_bucket {
                    return Err(StorageError::MaxLocalVirtualGroups {
                        current,
                        limit: params.max_local_virtual_group_num_per_bucket,
                    });
                }
                internal.local_virtual_groups.push(LocalVirtualGroup {
                    id: internal.next_lvg_id,
                    gvg_id: gvg.id,
                    total_charge_size: 0,
                    stored_size: 0,
                });
                internal.next_lvg_id += 1;
                internal.local_virtual_groups.len() - 1
            }
        };

        let charge = self.charge_size(&ctx.store, internal.price_time, payload_size);
        let flows = self.object_flow_deltas(
            &ctx.store,
            bucket,
            &internal.local_virtual_groups[lvg_index],
            internal.price_time,
            charge,
            1,
        )?;
        self.apply_bucket_flows(ctx, bucket, flows)?;
        let lvg = &mut internal.local_virtual_groups[lvg_index];
        lvg.total_charge_size += charge;
        internal.total_charge_size += charge;
        Ok(lvg.id)
    }

    /// Seal a created object: verify the aggregated secondary-SP BLS
    /// signature, account the stored size and mint the ERC-721 twin.
    pub fn seal_object(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        bucket_name: &str,
        object_name: &str,
        secondary_signature: &BlsSignature,
    ) -> Result<(), StorageError> {
        let bucket = self
            .get_bucket(&ctx.store, bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: bucket_name.to_string() })?;
        let mut object = self
            .get_object(&ctx.store, bucket_name, object_name)
            .ok_or_else(|| StorageError::ObjectNotFound { name: object_name.to_string() })?;
        if object.status != ObjectStatus::Created {
            return Err(StorageError::InvalidObjectStatus { name: object.name });
        }
        let sp = self
            .sp
            .sp_by_operator(&ctx.store, bucket.primary_sp_address)
            .ok_or(StorageError::SpUnavailable { addr: bucket.primary_sp_address })?;
        if operator != sp.seal {
            return Err(StorageError::AccessDenied { operator });
        }

        let mut internal = self
            .get_internal_bucket(&ctx.store, bucket.id)
            .unwrap_or_else(|| panic!("bucket {} missing internal info", bucket.name));
        let lvg_index = internal
            .local_virtual_groups
            .iter()
            .position(|lvg| lvg.id == object.lvg_id)
            .unwrap_or_else(|| panic!("object lvg {} missing", object.lvg_id));
        let gvg = self
            .vg
            .gvg(&ctx.store, internal.local_virtual_groups[lvg_index].gvg_id)
            .unwrap_or_else(|| panic!("lvg gvg missing"));

        let mut pubkeys = Vec::with_capacity(gvg.secondary_sp_ids.len());
        for sp_id in &gvg.secondary_sp_ids {
            let secondary = self
                .sp
                .sp_by_id(&ctx.store, *sp_id)
                .unwrap_or_else(|| panic!("secondary sp {sp_id} missing"));
            pubkeys.push(secondary.bls_pubkey);
        }
        let digest = seal_digest(&bucket, &object);
        if !verify_bls_aggregate(&digest, secondary_signature, &pubkeys) {
            return Err(StorageError::InvalidSealSignature);
        }

        object.status = ObjectStatus::Sealed;
        object.updated_at = ctx.block.time;
        internal.local_virtual_groups[lvg_index].stored_size += object.payload_size;
        self.vg.add_stored_size(ctx, gvg.id, object.payload_size as i64)?;

        // Non-empty by construction here; the twin mints exactly once.
        self.nft
            .mint(ctx, object.id, object.owner)
            .map_err(|reason| StorageError::NftCallFailed { reason })?;

        put_obj(&mut ctx.store, keys::object_key(bucket_name, object_name), &object);
        put_obj(&mut ctx.store, keys::internal_bucket_key(bucket.id), &internal);
        ctx.events.emit(events::seal_object(&object));
        Ok(())
    }

    /// Delete a sealed object, refunding its fees and burning the twin
    /// when one was minted. A failed burn fails the delete atomically.
    pub fn delete_object(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        bucket_name: &str,
        object_name: &str,
    ) -> Result<(), StorageError> {
        let bucket = self
            .get_bucket(&ctx.store, bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: bucket_name.to_string() })?;
        let object = self
            .get_object(&ctx.store, bucket_name, object_name)
            .ok_or_else(|| StorageError::ObjectNotFound { name: object_name.to_string() })?;
        if object.status != ObjectStatus::Sealed {
            return Err(StorageError::InvalidObjectStatus { name: object.name });
        }
        ensure_permission(
            &ctx.store,
            operator,
            object.owner,
            ResourceType::Object,
            object.id,
            ActionType::DeleteObject,
            ctx.block.time,
        )?;
        self.remove_object(ctx, &bucket, object, ObjectStatus::Sealed, false)
    }

    /// Cancel a created (unsealed) object, refunding the locked fee.
    pub fn cancel_create_object(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        bucket_name: &str,
        object_name: &str,
    ) -> Result<(), StorageError> {
        let bucket = self
            .get_bucket(&ctx.store, bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: bucket_name.to_string() })?;
        let object = self
            .get_object(&ctx.store, bucket_name, object_name)
            .ok_or_else(|| StorageError::ObjectNotFound { name: object_name.to_string() })?;
        if object.status != ObjectStatus::Created {
            return Err(StorageError::InvalidObjectStatus { name: object.name });
        }
        if operator != object.owner {
            return Err(StorageError::AccessDenied { operator });
        }
        self.remove_object(ctx, &bucket, object, ObjectStatus::Created, false)
    }

    /// Forced deletion used by the end-blocker for discontinued entities.
    /// The burn decision reads the status saved at discontinue time.
    pub fn force_delete_object(
        &self,
        ctx: &mut Context<'_>,
        bucket_name: &str,
        object_name: &str,
    ) -> Result<(), StorageError> {
        let bucket = self
            .get_bucket(&ctx.store, bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: bucket_name.to_string() })?;
        let object = self
            .get_object(&ctx.store, bucket_name, object_name)
            .ok_or_else(|| StorageError::ObjectNotFound { name: object_name.to_string() })?;
        let original_status: ObjectStatus =
            get_obj(&ctx.store, &keys::original_status_key(object.id)).unwrap_or(object.status);
        self.remove_object(ctx, &bucket, object, original_status, true)
    }

    /// Refund old content and charge for new. A zero new payload leaves
    /// the object chargeless and the bucket's total reflects it.
    pub fn update_object_content(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        bucket_name: &str,
        object_name: &str,
        new_payload_size: u64,
        new_checksums: Vec<Hash>,
    ) -> Result<(), StorageError> {
        let bucket = self
            .get_bucket(&ctx.store, bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: bucket_name.to_string() })?;
        let mut object = self
            .get_object(&ctx.store, bucket_name, object_name)
            .ok_or_else(|| StorageError::ObjectNotFound { name: object_name.to_string() })?;
        if object.status != ObjectStatus::Sealed {
            return Err(StorageError::InvalidObjectStatus { name: object.name });
        }
        ensure_permission(
            &ctx.store,
            operator,
            object.owner,
            ResourceType::Object,
            object.id,
            ActionType::UpdateObjectContent,
            ctx.block.time,
        )?;
        let mut internal = self
            .get_internal_bucket(&ctx.store, bucket.id)
            .unwrap_or_else(|| panic!("bucket {} missing internal info", bucket.name));

        // Refund the old content.
        if object.payload_size > 0 {
            let lvg_index = internal
                .local_virtual_groups
                .iter()
                .position(|lvg| lvg.id == object.lvg_id)
                .unwrap_or_else(|| panic!("object lvg {} missing", object.lvg_id));
            let old_charge =
                self.charge_size(&ctx.store, internal.price_time, object.payload_size);
            let refund = self.object_flow_deltas(
                &ctx.store,
                &bucket,
                &internal.local_virtual_groups[lvg_index],
                internal.price_time,
                old_charge,
                -1,
            )?;
            self.apply_bucket_flows(ctx, &bucket, refund)?;
            let gvg_id = internal.local_virtual_groups[lvg_index].gvg_id;
            let lvg = &mut internal.local_virtual_groups[lvg_index];
            lvg.total_charge_size -= old_charge;
            lvg.stored_size = lvg.stored_size.saturating_sub(object.payload_size);
            internal.total_charge_size -= old_charge;
            self.vg.add_stored_size(ctx, gvg_id, -(object.payload_size as i64))?;
        }

        // Charge the new content.
        if new_payload_size > 0 {
            let lvg_id = self.land_object(ctx, &bucket, &mut internal, new_payload_size)?;
            object.lvg_id = lvg_id;
            let lvg_index = internal
                .local_virtual_groups
                .iter()
                .position(|lvg| lvg.id == lvg_id)
                .unwrap_or_else(|| panic!("landed lvg missing"));
            let gvg_id = internal.local_virtual_groups[lvg_index].gvg_id;
            internal.local_virtual_groups[lvg_index].stored_size += new_payload_size;
            self.vg.add_stored_size(ctx, gvg_id, new_payload_size as i64)?;
        } else {
            object.lvg_id = 0;
        }

        object.payload_size = new_payload_size;
        object.checksums = new_checksums;
        object.updated_at = ctx.block.time;
        put_obj(&mut ctx.store, keys::object_key(bucket_name, object_name), &object);
        put_obj(&mut ctx.store, keys::internal_bucket_key(bucket.id), &internal);
        ctx.events.emit(events::update_object_content(&object));
        Ok(())
    }

    /// Copy an object into another bucket as a fresh creation. The
    /// destination SP's approval is checked exactly like CreateBucket's.
    pub fn copy_object(
        &self,
        ctx: &mut Context<'_>,
        msg: CopyObjectMsg,
    ) -> Result<ObjectId, StorageError> {
        let src = self
            .get_object(&ctx.store, &msg.src_bucket_name, &msg.src_object_name)
            .ok_or_else(|| StorageError::ObjectNotFound { name: msg.src_object_name.clone() })?;
        if src.status != ObjectStatus::Sealed {
            return Err(StorageError::InvalidObjectStatus { name: src.name });
        }
        ensure_permission(
            &ctx.store,
            msg.operator,
            src.owner,
            ResourceType::Object,
            src.id,
            ActionType::CopyObject,
            ctx.block.time,
        )?;

        let dst_bucket = self
            .get_bucket(&ctx.store, &msg.dst_bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound { name: msg.dst_bucket_name.clone() })?;
        let sp = self
            .sp
            .sp_by_operator(&ctx.store, dst_bucket.primary_sp_address)
            .filter(|sp| sp.status.is_in_service() && !sp.approval.is_zero())
            .ok_or(StorageError::SpUnavailable { addr: dst_bucket.primary_sp_address })?;
        check_approval(
            ctx,
            &sp,
            msg.dst_primary_sp_approval.as_ref(),
            msg.approval_msg_bytes.as_deref(),
        )?;

        self.create_object(
            ctx,
            CreateObjectMsg {
                operator: msg.operator,
                bucket_name: msg.dst_bucket_name,
                object_name: msg.dst_object_name,
                payload_size: src.payload_size,
                checksums: src.checksums,
                visibility: src.visibility,
                source_type: SourceType::Origin,
            },
        )
    }

    /// Mark an object as mirror-pending.
    pub fn mirror_object(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        bucket_name: &str,
        object_name: &str,
    ) -> Result<ObjectId, StorageError> {
        let mut object = self
            .get_object(&ctx.store, bucket_name, object_name)
            .ok_or_else(|| StorageError::ObjectNotFound { name: object_name.to_string() })?;
        if operator != object.owner {
            return Err(StorageError::AccessDenied { operator });
        }
        object.source_type = SourceType::MirrorPending;
        put_obj(&mut ctx.store, keys::object_key(bucket_name, object_name), &object);
        Ok(object.id)
    }

    /// Resolve a pending object mirror from the ack.
    pub fn ack_mirror_object(
        &self,
        ctx: &mut Context<'_>,
        id: ObjectId,
        success: bool,
    ) -> Result<(), StorageError> {
        let (bucket_name, object_name) = self
            .get_object_key_by_id(&ctx.store, id)
            .ok_or(StorageError::ObjectNotFound { name: id.to_string() })?;
        let mut object = self
            .get_object(&ctx.store, &bucket_name, &object_name)
            .ok_or(StorageError::ObjectNotFound { name: object_name.clone() })?;
        object.source_type =
            if success { SourceType::CrossChain } else { SourceType::Origin };
        put_obj(&mut ctx.store, keys::object_key(&bucket_name, &object_name), &object);
        Ok(())
    }

    // =========================================================================
    // SHARED REMOVAL PATH
    // =========================================================================

    /// Refund, burn-if-minted, and drop an object. `original_status`
    /// decides the burn; the DISCONTINUED marker never reaches here.
    pub(crate) fn remove_object(
        &self,
        ctx: &mut Context<'_>,
        bucket: &BucketInfo,
        object: ObjectInfo,
        original_status: ObjectStatus,
        forced: bool,
    ) -> Result<(), StorageError> {
        let mut internal = self
            .get_internal_bucket(&ctx.store, bucket.id)
            .unwrap_or_else(|| panic!("bucket {} missing internal info", bucket.name));

        if object.payload_size > 0 {
            let lvg_index = internal
                .local_virtual_groups
                .iter()
                .position(|lvg| lvg.id == object.lvg_id)
                .unwrap_or_else(|| panic!("object lvg {} missing", object.lvg_id));
            let charge = self.charge_size(&ctx.store, internal.price_time, object.payload_size);
            let refund = self.object_flow_deltas(
                &ctx.store,
                bucket,
                &internal.local_virtual_groups[lvg_index],
                internal.price_time,
                charge,
                -1,
            )?;
            self.apply_bucket_flows(ctx, bucket, refund)?;
            let gvg_id = internal.local_virtual_groups[lvg_index].gvg_id;
            let lvg = &mut internal.local_virtual_groups[lvg_index];
            lvg.total_charge_size -= charge;
            internal.total_charge_size -= charge;
            if original_status == ObjectStatus::Sealed {
                lvg.stored_size = lvg.stored_size.saturating_sub(object.payload_size);
                self.vg.add_stored_size(ctx, gvg_id, -(object.payload_size as i64))?;
            }
        }

        if original_status == ObjectStatus::Sealed && object.payload_size > 0 {
            // Burn failure must fail the whole delete; nothing below has
            // committed yet and the error unwinds through the cache ctx.
            self.nft
                .burn(ctx, object.id)
                .map_err(|reason| StorageError::NftCallFailed { reason })?;
        }

        ctx.store.delete(&keys::object_key(&object.bucket_name, &object.name));
        ctx.store.delete(&keys::object_id_index_key(object.id));
        ctx.store.delete(&keys::original_status_key(object.id));
        self.remove_policies_for_resource(ctx, ResourceType::Object, object.id);
        internal.object_count = internal.object_count.saturating_sub(1);
        put_obj(&mut ctx.store, keys::internal_bucket_key(bucket.id), &internal);
        ctx.events.emit(events::delete_object(
            object.id,
            &object.bucket_name,
            &object.name,
            forced,
        ));
        Ok(())
    }
}
