//! # mc-07-lifecycle
//!
//! Block lifecycle controller for Moca-Chain.
//!
//! ## Per-Block Flow
//!
//! 1. PreBlock: apply a scheduled upgrade plan due at this height
//! 2. BeginBlock: hardfork scheduler (config `{height → plan}` map),
//!    then module begin-blockers in a fixed order
//! 3. DeliverTx: handled by the caller on the single execution lane
//! 4. EndBlock: module end-blockers, fee market last
//! 5. Reconciliation: bank and payment namespace diffs must conserve
//!    value; a violation halts the node

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod hardfork;
pub mod keys;
pub mod ordering;
pub mod params;
pub mod upgrade;

pub use controller::{BlockLifecycle, BlockSnapshots, ModuleHook, PaymentCheck};
pub use hardfork::{HardforkEntry, UpgradePlan};
pub use ordering::{BEGIN_BLOCK_ORDER, END_BLOCK_ORDER};
pub use upgrade::{UpgradeHandlerRegistry, VersionMap};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
