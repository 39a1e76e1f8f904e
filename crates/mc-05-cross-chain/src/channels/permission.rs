//! # Permission Channel
//!
//! Syn ops: CreatePolicy (0x01), DeletePolicy (0x02). Policies are
//! inbound-only; no ack flow exists for this channel.

use crate::dispatcher::{ChannelApp, SynResult};
use crate::errors::BridgeError;
use crate::packages::{CreatePolicySynPackage, DeletePolicySynPackage};
use crate::ports::{BridgePolicy, StorageBridgeApi};
use shared_store::Context;
use shared_types::Uint;
use std::sync::Arc;

const OP_CREATE_POLICY: u8 = 0x01;
const OP_DELETE_POLICY: u8 = 0x02;

/// Permission channel app.
pub struct PermissionChannel {
    storage: Arc<dyn StorageBridgeApi>,
}

impl PermissionChannel {
    /// Build over the storage port.
    pub fn new(storage: Arc<dyn StorageBridgeApi>) -> Self {
        Self { storage }
    }
}

impl ChannelApp for PermissionChannel {
    fn execute_syn(
        &self,
        ctx: &mut Context<'_>,
        op: u8,
        payload: &[u8],
    ) -> Result<SynResult, BridgeError> {
        match op {
            OP_CREATE_POLICY => {
                let package = CreatePolicySynPackage::decode(payload);
                let id = self
                    .storage
                    .put_policy(
                        ctx,
                        BridgePolicy {
                            operator: package.operator,
                            principal_type: package.principal_type,
                            principal_value: package.principal_value,
                            resource_type: package.resource_type,
                            resource_id: package.resource_id,
                            action: package.action,
                            effect: package.effect,
                            expiration_time: package.expiration_time,
                        },
                    )
                    .map_err(|reason| BridgeError::Handler {
                        reason,
                        extra_data: package.extra_data.clone(),
                    })?;
                Ok(SynResult { id, extra_data: package.extra_data })
            }
            OP_DELETE_POLICY => {
                let package = DeletePolicySynPackage::decode(payload);
                self.storage
                    .delete_policy(
                        ctx,
                        BridgePolicy {
                            operator: package.operator,
                            principal_type: package.principal_type,
                            principal_value: package.principal_value,
                            resource_type: package.resource_type,
                            resource_id: package.resource_id,
                            action: 0,
                            effect: 0,
                            expiration_time: 0,
                        },
                    )
                    .map_err(|reason| BridgeError::Handler {
                        reason,
                        extra_data: package.extra_data.clone(),
                    })?;
                Ok(SynResult { id: Uint::zero(), extra_data: package.extra_data })
            }
            other => panic!("unknown permission channel syn op {other:#04x}"),
        }
    }

    fn execute_ack(
        &self,
        _ctx: &mut Context<'_>,
        op: u8,
        _payload: &[u8],
    ) -> Result<(), BridgeError> {
        panic!("unknown permission channel ack op {op:#04x}");
    }

    fn execute_fail_ack(
        &self,
        _ctx: &mut Context<'_>,
        op: u8,
        _payload: &[u8],
    ) -> Result<(), BridgeError> {
        panic!("unknown permission channel fail ack op {op:#04x}");
    }
}
