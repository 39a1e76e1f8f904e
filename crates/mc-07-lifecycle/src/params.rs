//! # Cross-Module Params Touched by Upgrades
//!
//! The SDK modules own these at runtime; upgrade handlers write them
//! here and the module adapters read through. Ratios use 18-decimal
//! strings, the convention the governance tooling expects.

use serde::{Deserialize, Serialize};

/// Governance params subset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovParams {
    /// Minimum initial deposit as a ratio of the full deposit.
    pub min_deposit_ratio: String,
}

impl Default for GovParams {
    fn default() -> Self {
        Self { min_deposit_ratio: "0.000000000000000000".to_string() }
    }
}

/// EVM params subset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EvmParams {
    /// Accept pre-EIP-155 transactions.
    pub allow_unprotected_txs: bool,
}
