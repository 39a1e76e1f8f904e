//! # MocaSBT Channel
//!
//! Soulbound token attestations bridged from the source chain. Tokens
//! are non-transferable records: mint writes, burn removes.

use crate::dispatcher::{ChannelApp, SynResult};
use crate::errors::BridgeError;
use crate::keys;
use crate::packages::{BurnSbtSynPackage, MintSbtSynPackage};
use serde::{Deserialize, Serialize};
use shared_store::kv::put_obj;
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{Address, Uint};

const OP_MINT: u8 = 0x01;
const OP_BURN: u8 = 0x02;

/// A bridged soulbound token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoulboundToken {
    /// Holder; the token never moves.
    pub owner: Address,
    /// Metadata URI.
    pub uri: String,
}

/// MocaSBT channel app.
#[derive(Default)]
pub struct SbtChannel;

impl SbtChannel {
    /// Token by id.
    pub fn get(store: &dyn KvRead, token_id: Uint) -> Option<SoulboundToken> {
        shared_store::kv::get_obj(store, &keys::sbt_key(token_id))
    }
}

impl ChannelApp for SbtChannel {
    fn execute_syn(
        &self,
        ctx: &mut Context<'_>,
        op: u8,
        payload: &[u8],
    ) -> Result<SynResult, BridgeError> {
        match op {
            OP_MINT => {
                let package = MintSbtSynPackage::decode(payload);
                let key = keys::sbt_key(package.token_id);
                if ctx.store.has(&key) {
                    return Err(BridgeError::Handler {
                        reason: "sbt already minted".to_string(),
                        extra_data: package.extra_data,
                    });
                }
                put_obj(
                    &mut ctx.store,
                    key,
                    &SoulboundToken { owner: package.to, uri: package.uri },
                );
                Ok(SynResult { id: package.token_id, extra_data: package.extra_data })
            }
            OP_BURN => {
                let package = BurnSbtSynPackage::decode(payload);
                let key = keys::sbt_key(package.token_id);
                if !ctx.store.has(&key) {
                    return Err(BridgeError::Handler {
                        reason: "sbt not found".to_string(),
                        extra_data: package.extra_data,
                    });
                }
                ctx.store.delete(&key);
                Ok(SynResult { id: package.token_id, extra_data: package.extra_data })
            }
            other => panic!("unknown moca-sbt channel syn op {other:#04x}"),
        }
    }

    fn execute_ack(
        &self,
        _ctx: &mut Context<'_>,
        op: u8,
        _payload: &[u8],
    ) -> Result<(), BridgeError> {
        panic!("unknown moca-sbt channel ack op {op:#04x}");
    }

    fn execute_fail_ack(
        &self,
        _ctx: &mut Context<'_>,
        op: u8,
        _payload: &[u8],
    ) -> Result<(), BridgeError> {
        panic!("unknown moca-sbt channel fail ack op {op:#04x}");
    }
}
