//! # mc-05-cross-chain
//!
//! Cross-chain packet engine for Moca-Chain.
//!
//! ## Wire Format
//!
//! Every package is `1 byte operationType || abi-encoded tuple`. An
//! operation byte with the high bit set (≥ 0x80) is a V2 format; the
//! high bit cleared is V1. The two families decode through disjoint
//! branches and never fall back to one another: a V2 payload offered
//! under a V1 opcode is rejected, not reinterpreted.
//!
//! Ack responses re-wrap the SAME operation byte around
//! `1 byte status (0 = success, 1 = fail) || 32-byte id || extra data`.
//!
//! ## Channels
//!
//! | Channel | Syn ops | Ack/FailAck ops |
//! |---------|---------|-----------------|
//! | Bucket | 0x02 Create, 0x03 Delete, 0x82 CreateV2 | 0x01 Mirror |
//! | Object | 0x03 Delete | 0x01 Mirror |
//! | Group | 0x02 Create, 0x03 Delete | 0x01 Mirror |
//! | Permission | 0x01 CreatePolicy, 0x02 DeletePolicy | — |
//! | MocaSBT | 0x01 Mint, 0x02 Burn | — |
//! | MocaVC | 0x01 Register, 0x02 Revoke | — |
//!
//! An unknown operation type or channel id panics: accepting it would
//! be a consensus-critical divergence.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod channels;
pub mod codec;
pub mod dispatcher;
pub mod errors;
pub mod keys;
pub mod packages;
pub mod ports;

pub use codec::{is_v2_op, unwrap_ack, wrap_ack, AckStatus};
pub use dispatcher::{ChannelApp, CrossChainDispatcher};
pub use errors::BridgeError;
pub use ports::StorageBridgeApi;

/// Channel identifiers.
pub mod channel_ids {
    /// Permission policies.
    pub const PERMISSION: u8 = 0x01;
    /// Buckets.
    pub const BUCKET: u8 = 0x04;
    /// Objects.
    pub const OBJECT: u8 = 0x05;
    /// Groups.
    pub const GROUP: u8 = 0x06;
    /// Soulbound tokens.
    pub const MOCA_SBT: u8 = 0x07;
    /// Verifiable credentials.
    pub const MOCA_VC: u8 = 0x08;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
