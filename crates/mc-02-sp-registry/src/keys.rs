//! # SP Store Keys
//!
//! Slash records key by `(sp_id, object_id, height)` so that removing a
//! height range never clobbers another SP's record for the same object.

use shared_store::kv::namespaces;
use shared_types::{Address, ObjectId, SpId};

const SP: u8 = 0x01;
const IDX_OPERATOR: u8 = 0x02;
const IDX_FUNDING: u8 = 0x03;
const IDX_SEAL: u8 = 0x04;
const IDX_APPROVAL: u8 = 0x05;
const IDX_GC: u8 = 0x06;
const IDX_BLS: u8 = 0x07;
const SEQUENCE: u8 = 0x08;
const PARAMS: u8 = 0x09;
const SP_PRICE: u8 = 0x0A;
const GLOBAL_PRICE: u8 = 0x0B;
const SLASH: u8 = 0x0C;

/// SP record by id.
pub fn sp_key(id: SpId) -> Vec<u8> {
    let mut key = vec![namespaces::SP, SP];
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Prefix over every SP record.
pub fn sp_prefix() -> Vec<u8> {
    vec![namespaces::SP, SP]
}

fn address_index(tag: u8, addr: Address) -> Vec<u8> {
    let mut key = vec![namespaces::SP, tag];
    key.extend_from_slice(addr.as_bytes());
    key
}

/// Operator address index.
pub fn operator_index_key(addr: Address) -> Vec<u8> {
    address_index(IDX_OPERATOR, addr)
}

/// Funding address index.
pub fn funding_index_key(addr: Address) -> Vec<u8> {
    address_index(IDX_FUNDING, addr)
}

/// Seal address index.
pub fn seal_index_key(addr: Address) -> Vec<u8> {
    address_index(IDX_SEAL, addr)
}

/// Approval address index.
pub fn approval_index_key(addr: Address) -> Vec<u8> {
    address_index(IDX_APPROVAL, addr)
}

/// GC address index.
pub fn gc_index_key(addr: Address) -> Vec<u8> {
    address_index(IDX_GC, addr)
}

/// BLS public key index.
pub fn bls_index_key(pubkey: &[u8; 48]) -> Vec<u8> {
    let mut key = vec![namespaces::SP, IDX_BLS];
    key.extend_from_slice(pubkey);
    key
}

/// Next SP id sequence.
pub fn sequence_key() -> Vec<u8> {
    vec![namespaces::SP, SEQUENCE]
}

/// Governance parameters.
pub fn params_key() -> Vec<u8> {
    vec![namespaces::SP, PARAMS]
}

/// Per-SP price record.
pub fn sp_price_key(sp_id: SpId) -> Vec<u8> {
    let mut key = vec![namespaces::SP, SP_PRICE];
    key.extend_from_slice(&sp_id.to_be_bytes());
    key
}

/// Prefix over all SP prices.
pub fn sp_price_prefix() -> Vec<u8> {
    vec![namespaces::SP, SP_PRICE]
}

/// Global price snapshot by update time (ascending).
pub fn global_price_key(update_time: i64) -> Vec<u8> {
    let mut key = vec![namespaces::SP, GLOBAL_PRICE];
    key.extend_from_slice(&(update_time as u64).to_be_bytes());
    key
}

/// Prefix over global price snapshots.
pub fn global_price_prefix() -> Vec<u8> {
    vec![namespaces::SP, GLOBAL_PRICE]
}

/// Slash record by `(sp, object, height)`.
pub fn slash_key(sp_id: SpId, object_id: ObjectId, height: u64) -> Vec<u8> {
    let mut key = vec![namespaces::SP, SLASH];
    key.extend_from_slice(&sp_id.to_be_bytes());
    let mut object_bytes = [0u8; 32];
    object_id.to_big_endian(&mut object_bytes);
    key.extend_from_slice(&object_bytes);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// Prefix over one SP's slash records for one object.
pub fn slash_object_prefix(sp_id: SpId, object_id: ObjectId) -> Vec<u8> {
    let mut key = vec![namespaces::SP, SLASH];
    key.extend_from_slice(&sp_id.to_be_bytes());
    let mut object_bytes = [0u8; 32];
    object_id.to_big_endian(&mut object_bytes);
    key.extend_from_slice(&object_bytes);
    key
}

/// Prefix over every slash record.
pub fn slash_prefix() -> Vec<u8> {
    vec![namespaces::SP, SLASH]
}

/// Height parsed back out of a slash key.
pub fn slash_key_height(key: &[u8]) -> u64 {
    let start = key.len() - 8;
    u64::from_be_bytes(key[start..].try_into().unwrap_or_else(|_| panic!("malformed slash key")))
}
