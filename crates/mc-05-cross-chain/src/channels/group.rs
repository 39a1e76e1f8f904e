//! # Group Channel
//!
//! Syn ops: Create (0x02), Delete (0x03). No V2 format exists for
//! groups; a high-bit op here is unknown by definition.

use crate::dispatcher::{ChannelApp, SynResult};
use crate::errors::BridgeError;
use crate::packages::{ops, CreateGroupSynPackage, DeleteSynPackage};
use crate::ports::StorageBridgeApi;
use shared_store::Context;
use std::sync::Arc;

/// Group channel app.
pub struct GroupChannel {
    storage: Arc<dyn StorageBridgeApi>,
}

impl GroupChannel {
    /// Build over the storage port.
    pub fn new(storage: Arc<dyn StorageBridgeApi>) -> Self {
        Self { storage }
    }
}

impl ChannelApp for GroupChannel {
    fn execute_syn(
        &self,
        ctx: &mut Context<'_>,
        op: u8,
        payload: &[u8],
    ) -> Result<SynResult, BridgeError> {
        match op {
            ops::CREATE => {
                let package = CreateGroupSynPackage::decode(payload);
                let id = self
                    .storage
                    .create_group(ctx, package.owner, &package.group_name)
                    .map_err(|reason| BridgeError::Handler {
                        reason,
                        extra_data: package.extra_data.clone(),
                    })?;
                Ok(SynResult { id, extra_data: package.extra_data })
            }
            ops::DELETE => {
                let package = DeleteSynPackage::decode(payload);
                self.storage
                    .delete_group(ctx, package.operator, package.id)
                    .map_err(|reason| BridgeError::Handler {
                        reason,
                        extra_data: package.extra_data.clone(),
                    })?;
                Ok(SynResult { id: package.id, extra_data: package.extra_data })
            }
            other => panic!("unknown group channel syn op {other:#04x}"),
        }
    }

    fn execute_ack(
        &self,
        _ctx: &mut Context<'_>,
        op: u8,
        _payload: &[u8],
    ) -> Result<(), BridgeError> {
        panic!("unknown group channel ack op {op:#04x}");
    }

    fn execute_fail_ack(
        &self,
        _ctx: &mut Context<'_>,
        op: u8,
        _payload: &[u8],
    ) -> Result<(), BridgeError> {
        panic!("unknown group channel fail ack op {op:#04x}");
    }
}
