//! # MocaVC Channel
//!
//! Verifiable-credential hashes anchored from the source chain:
//! register writes the issuer under the hash, revoke removes it.

use crate::dispatcher::{ChannelApp, SynResult};
use crate::errors::BridgeError;
use crate::keys;
use crate::packages::{RegisterVcSynPackage, RevokeVcSynPackage};
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{Address, Uint};

const OP_REGISTER: u8 = 0x01;
const OP_REVOKE: u8 = 0x02;

/// MocaVC channel app.
#[derive(Default)]
pub struct VcChannel;

impl VcChannel {
    /// Issuer anchored under a credential hash, if any.
    pub fn issuer_of(store: &dyn KvRead, vc_hash: &[u8; 32]) -> Option<Address> {
        store
            .get(&keys::vc_key(vc_hash))
            .and_then(|bytes| Address::from_slice(&bytes))
    }
}

impl ChannelApp for VcChannel {
    fn execute_syn(
        &self,
        ctx: &mut Context<'_>,
        op: u8,
        payload: &[u8],
    ) -> Result<SynResult, BridgeError> {
        match op {
            OP_REGISTER => {
                let package = RegisterVcSynPackage::decode(payload);
                let key = keys::vc_key(&package.vc_hash);
                if ctx.store.has(&key) {
                    return Err(BridgeError::Handler {
                        reason: "credential already registered".to_string(),
                        extra_data: package.extra_data,
                    });
                }
                ctx.store.set(key, package.issuer.as_bytes().to_vec());
                Ok(SynResult {
                    id: Uint::from_big_endian(&package.vc_hash),
                    extra_data: package.extra_data,
                })
            }
            OP_REVOKE => {
                let package = RevokeVcSynPackage::decode(payload);
                let key = keys::vc_key(&package.vc_hash);
                if !ctx.store.has(&key) {
                    return Err(BridgeError::Handler {
                        reason: "credential not found".to_string(),
                        extra_data: package.extra_data,
                    });
                }
                ctx.store.delete(&key);
                Ok(SynResult {
                    id: Uint::from_big_endian(&package.vc_hash),
                    extra_data: package.extra_data,
                })
            }
            other => panic!("unknown moca-vc channel syn op {other:#04x}"),
        }
    }

    fn execute_ack(
        &self,
        _ctx: &mut Context<'_>,
        op: u8,
        _payload: &[u8],
    ) -> Result<(), BridgeError> {
        panic!("unknown moca-vc channel ack op {op:#04x}");
    }

    fn execute_fail_ack(
        &self,
        _ctx: &mut Context<'_>,
        op: u8,
        _payload: &[u8],
    ) -> Result<(), BridgeError> {
        panic!("unknown moca-vc channel fail ack op {op:#04x}");
    }
}
