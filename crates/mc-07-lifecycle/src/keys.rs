//! # Lifecycle Store Keys

use shared_store::kv::namespaces;

const PLAN: u8 = 0x01;
const GOV_PARAMS: u8 = 0x02;
const EVM_PARAMS: u8 = 0x03;
const VERSION_MAP: u8 = 0x04;

/// Scheduled upgrade plan by height.
pub fn plan_key(height: u64) -> Vec<u8> {
    let mut key = vec![namespaces::UPGRADE, PLAN];
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// Governance params touched by upgrade handlers.
pub fn gov_params_key() -> Vec<u8> {
    vec![namespaces::UPGRADE, GOV_PARAMS]
}

/// EVM params touched by upgrade handlers.
pub fn evm_params_key() -> Vec<u8> {
    vec![namespaces::UPGRADE, EVM_PARAMS]
}

/// Module consensus-version map.
pub fn version_map_key() -> Vec<u8> {
    vec![namespaces::UPGRADE, VERSION_MAP]
}
