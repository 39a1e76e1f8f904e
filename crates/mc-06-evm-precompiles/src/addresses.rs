//! # Fixed Precompile Addresses
//!
//! The SDK-module shims (bank, auth, staking, slashing, distribution,
//! evidence, gov) sit in the 0x…1000 range; the storage-chain adapters
//! in 0x…2000. The object-NFT contract has its own fixed address the
//! seal/delete paths call into.

use shared_types::Address;

const fn fixed(tail: u16) -> Address {
    let mut bytes = [0u8; 20];
    bytes[18] = (tail >> 8) as u8;
    bytes[19] = (tail & 0xFF) as u8;
    Address(bytes)
}

/// Bank module shim.
pub const BANK: Address = fixed(0x1000);
/// Auth module shim.
pub const AUTH: Address = fixed(0x1001);
/// Governance shim.
pub const GOV: Address = fixed(0x1002);
/// Staking shim.
pub const STAKING: Address = fixed(0x1003);
/// Slashing shim.
pub const SLASHING: Address = fixed(0x1004);
/// Distribution shim.
pub const DISTRIBUTION: Address = fixed(0x1005);
/// Evidence shim.
pub const EVIDENCE: Address = fixed(0x1006);
/// ERC20 bridge shim.
pub const ERC20: Address = fixed(0x1007);

/// Payment adapter.
pub const PAYMENT: Address = fixed(0x2000);
/// Permission adapter.
pub const PERMISSION: Address = fixed(0x2001);
/// Storage adapter.
pub const STORAGE: Address = fixed(0x2002);
/// Virtual-group adapter.
pub const VIRTUAL_GROUP: Address = fixed(0x2003);
/// Storage-provider adapter.
pub const STORAGE_PROVIDER: Address = fixed(0x2004);

/// Non-transferable ERC-721 twin contract for sealed objects.
pub const OBJECT_NFT: Address = fixed(0x2010);
