//! # Virtual-Group Store Keys

use shared_store::kv::namespaces;
use shared_types::{FamilyId, GvgId};

const GVG: u8 = 0x01;
const FAMILY: u8 = 0x02;
const GVG_SEQUENCE: u8 = 0x03;
const FAMILY_SEQUENCE: u8 = 0x04;
const SWAP_OUT: u8 = 0x05;
const SWAP_IN: u8 = 0x06;
const PARAMS: u8 = 0x07;

/// GVG by id.
pub fn gvg_key(id: GvgId) -> Vec<u8> {
    let mut key = vec![namespaces::VIRTUAL_GROUP, GVG];
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Prefix over all GVGs.
pub fn gvg_prefix() -> Vec<u8> {
    vec![namespaces::VIRTUAL_GROUP, GVG]
}

/// Family by id.
pub fn family_key(id: FamilyId) -> Vec<u8> {
    let mut key = vec![namespaces::VIRTUAL_GROUP, FAMILY];
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Prefix over all families.
pub fn family_prefix() -> Vec<u8> {
    vec![namespaces::VIRTUAL_GROUP, FAMILY]
}

/// Next GVG id.
pub fn gvg_sequence_key() -> Vec<u8> {
    vec![namespaces::VIRTUAL_GROUP, GVG_SEQUENCE]
}

/// Next family id.
pub fn family_sequence_key() -> Vec<u8> {
    vec![namespaces::VIRTUAL_GROUP, FAMILY_SEQUENCE]
}

/// Swap-out reservation by `(family, gvg)`.
pub fn swap_out_key(family_id: FamilyId, gvg_id: GvgId) -> Vec<u8> {
    let mut key = vec![namespaces::VIRTUAL_GROUP, SWAP_OUT];
    key.extend_from_slice(&family_id.to_be_bytes());
    key.extend_from_slice(&gvg_id.to_be_bytes());
    key
}

/// Swap-in reservation by `(family, gvg)`; gvg 0 reserves the family.
pub fn swap_in_key(family_id: FamilyId, gvg_id: GvgId) -> Vec<u8> {
    let mut key = vec![namespaces::VIRTUAL_GROUP, SWAP_IN];
    key.extend_from_slice(&family_id.to_be_bytes());
    key.extend_from_slice(&gvg_id.to_be_bytes());
    key
}

/// Governance parameters.
pub fn params_key() -> Vec<u8> {
    vec![namespaces::VIRTUAL_GROUP, PARAMS]
}
