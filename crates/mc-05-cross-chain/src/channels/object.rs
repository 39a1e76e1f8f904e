//! # Object Channel
//!
//! Objects are only deleted cross-chain (0x03); creation needs a seal
//! flow no relayer can drive. Ack and FailAck resolve mirrors (0x01).

use crate::codec::{unwrap_ack, AckStatus};
use crate::dispatcher::{ChannelApp, SynResult};
use crate::errors::BridgeError;
use crate::packages::{ops, DeleteSynPackage, MirrorSynPackage};
use crate::ports::StorageBridgeApi;
use shared_store::Context;
use std::sync::Arc;

/// Object channel app.
pub struct ObjectChannel {
    storage: Arc<dyn StorageBridgeApi>,
}

impl ObjectChannel {
    /// Build over the storage port.
    pub fn new(storage: Arc<dyn StorageBridgeApi>) -> Self {
        Self { storage }
    }
}

impl ChannelApp for ObjectChannel {
    fn execute_syn(
        &self,
        ctx: &mut Context<'_>,
        op: u8,
        payload: &[u8],
    ) -> Result<SynResult, BridgeError> {
        match op {
            ops::DELETE => {
                let package = DeleteSynPackage::decode(payload);
                self.storage
                    .delete_object(ctx, package.operator, package.id)
                    .map_err(|reason| BridgeError::Handler {
                        reason,
                        extra_data: package.extra_data.clone(),
                    })?;
                Ok(SynResult { id: package.id, extra_data: package.extra_data })
            }
            other => panic!("unknown object channel syn op {other:#04x}"),
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
                    .ack_mirror_object(ctx, id, status == AckStatus::Success)
                    .map_err(|reason| BridgeError::Handler { reason, extra_data: Vec::new() })
            }
            other => panic!("unknown object channel ack op {other:#04x}"),
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
                let package = MirrorSynPackage::decode(payload);
                self.storage
                    .ack_mirror_object(ctx, package.id, false)
                    .map_err(|reason| BridgeError::Handler { reason, extra_data: Vec::new() })
            }
            other => panic!("unknown object channel fail ack op {other:#04x}"),
        }
    }
}
