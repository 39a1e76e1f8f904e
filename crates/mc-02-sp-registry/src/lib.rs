//! # mc-02-sp-registry
//!
//! Storage-provider registry for Moca-Chain.
//!
//! ## Role in System
//!
//! Storage providers are the operators that hold object payloads. The
//! registry owns their identities and lifecycle:
//!
//! - **Uniqueness indexes**: operator, funding, seal, approval and gc
//!   addresses plus the BLS public key each map to at most one SP
//! - **Key possession**: registration verifies a BLS self-signature over
//!   `tmhash(pubkey)` under the votepool DST
//! - **Two-phase exit**: `IN_SERVICE → GRACEFUL_EXITING` on request,
//!   deposit refund only after the virtual-group engine drains the SP
//! - **Prices**: per-SP read/store prices roll up into a time-versioned
//!   global price the storage engine charges against

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod events;
pub mod keys;
pub mod ports;
pub mod service;
pub mod timeutil;

pub use domain::entities::{
    Description, GlobalSpStorePrice, SpParams, SpPrice, StorageProvider,
};
pub use domain::errors::SpError;
pub use domain::value_objects::SpStatus;
pub use ports::SpApi;
pub use service::SpService;
pub use timeutil::is_last_days_of_the_month;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
