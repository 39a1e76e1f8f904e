//! # Bucket Channel
//!
//! Syn ops: Create (0x02), Delete (0x03), CreateV2 (0x82, adds the
//! family id). Ack and FailAck resolve pending mirrors (0x01). The V1
//! and V2 create decoders are disjoint; neither falls back to the
//! other, and an unknown operation byte panics.

use crate::codec::unwrap_ack;
use crate::dispatcher::{ChannelApp, SynResult};
use crate::errors::BridgeError;
use crate::packages::{ops, CreateBucketSynPackage, CreateBucketSynPackageV2, DeleteSynPackage};
use crate::ports::{BridgeCreateBucket, StorageBridgeApi};
use shared_store::Context;
use std::sync::Arc;

/// Bucket channel app.
pub struct BucketChannel {
    storage: Arc<dyn StorageBridgeApi>,
}

impl BucketChannel {
    /// Build over the storage port.
    pub fn new(storage: Arc<dyn StorageBridgeApi>) -> Self {
        Self { storage }
    }

    fn handle_create(
        &self,
        ctx: &mut Context<'_>,
        package: CreateBucketSynPackage,
        family_id: u32,
    ) -> Result<SynResult, BridgeError> {
        let extra_data = package.extra_data.clone();
        let id = self
            .storage
            .create_bucket(
                ctx,
                BridgeCreateBucket {
                    creator: package.creator,
                    bucket_name: package.bucket_name,
                    payment_address: package.payment_address,
                    primary_sp_address: package.primary_sp_address,
                    expired_height: package.expired_height,
                    approval_sig: package.approval_sig,
                    approval_msg_bytes: package.approval_msg_bytes,
                    charged_read_quota: package.charged_read_quota,
                    global_virtual_group_family_id: family_id,
                },
            )
            .map_err(|reason| BridgeError::Handler { reason, extra_data: extra_data.clone() })?;
        Ok(SynResult { id, extra_data })
    }
}

impl ChannelApp for BucketChannel {
    fn execute_syn(
        &self,
        ctx: &mut Context<'_>,
        op: u8,
        payload: &[u8],
    ) -> Result<SynResult, BridgeError> {
        match op {
            ops::CREATE => {
                let package = CreateBucketSynPackage::decode(payload);
                self.handle_create(ctx, package, 0)
            }
            ops::CREATE_V2 => {
                let package = CreateBucketSynPackageV2::decode(payload);
                let family_id = package.global_virtual_group_family_id;
                self.handle_create(ctx, package.base, family_id)
            }
            ops::DELETE => {
                let package = DeleteSynPackage::decode(payload);
                self.storage
                    .delete_bucket(ctx, package.operator, package.id)
                    .map_err(|reason| BridgeError::Handler {
                        reason,
                        extra_data: package.extra_data.clone(),
                    })?;
                Ok(SynResult { id: package.id, extra_data: package.extra_data })
            }
            other => panic!("unknown bucket channel syn op {other:#04x}"),
        }
    }

    fn execute_ack(
        &self,
        ctx: &mut Context<'_>,
        op: u8,
        payload: &[u8],
    ) -> Result<(), BridgeError> {
        match op {
            ops::MIRROR => {
                let (status, id, _extra) = unwrap_ack(payload);
                self.storage
                    .ack_mirror_bucket(ctx, id, status == crate::codec::AckStatus::Success)
                    .map_err(|reason| BridgeError::Handler { reason, extra_data: Vec::new() })
            }
            other => panic!("unknown bucket channel ack op {other:#04x}"),
        }
    }

    fn execute_fail_ack(
        &self,
        ctx: &mut Context<'_>,
        op: u8,
        payload: &[u8],
    ) -> Result<(), BridgeError> {
        match op {
            ops::MIRROR => {
                // The destination rejected the mirror outright; the syn
                // package comes back verbatim.
                let package = crate::packages::MirrorSynPackage::decode(payload);
                self.storage
                    .ack_mirror_bucket(ctx, package.id, false)
                    .map_err(|reason| BridgeError::Handler { reason, extra_data: Vec::new() })
            }
            other => panic!("unknown bucket channel fail ack op {other:#04x}"),
        }
    }
}
