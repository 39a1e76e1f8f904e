//! Concrete adapters: one precompile per module surface.

pub mod gov;
pub mod payment;
pub mod permission;
pub mod storage;
pub mod virtual_group;

pub use gov::GovPrecompile;
pub use payment::PaymentPrecompile;
pub use permission::PermissionPrecompile;
pub use storage::StoragePrecompile;
pub use virtual_group::VirtualGroupPrecompile;

use shared_crypto::keccak256;

/// First four bytes of `keccak256(signature)`.
pub(crate) fn selector(signature: &str) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&keccak256(signature.as_bytes())[..4]);
    out
}
