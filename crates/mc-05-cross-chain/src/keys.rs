//! # Cross-Chain Store Keys
//!
//! The SBT and VC channels keep their registries here; the entity
//! channels write through the storage engine instead.

use shared_store::kv::namespaces;
use shared_types::Uint;

const SBT: u8 = 0x01;
const VC: u8 = 0x02;

/// Soulbound token record by id.
pub fn sbt_key(token_id: Uint) -> Vec<u8> {
    let mut key = vec![namespaces::CROSS_CHAIN, SBT];
    let mut id = [0u8; 32];
    token_id.to_big_endian(&mut id);
    key.extend_from_slice(&id);
    key
}

/// Credential record by hash.
pub fn vc_key(vc_hash: &[u8; 32]) -> Vec<u8> {
    let mut key = vec![namespaces::CROSS_CHAIN, VC];
    key.extend_from_slice(vc_hash);
    key
}
