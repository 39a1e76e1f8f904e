//! # Node Configuration
//!
//! Runtime settings the operator supplies. Hardfork entries are
//! validated at startup: a malformed height or empty plan name must
//! stop the node before it processes a block with a half-configured
//! upgrade.

use mc_07_lifecycle::{hardfork::validate_hardforks, HardforkEntry, PaymentCheck};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Peer chain identifiers for the cross-chain bridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainConfig {
    /// This chain's id.
    pub src_chain_id: u32,
    /// BSC destination chain id.
    pub dest_bsc_chain_id: u32,
    /// opBNB destination chain id.
    pub dest_op_chain_id: u32,
    /// Polygon destination chain id.
    pub dest_polygon_chain_id: u32,
    /// Scroll destination chain id.
    pub dest_scroll_chain_id: u32,
    /// Linea destination chain id.
    pub dest_linea_chain_id: u32,
    /// Mantle destination chain id.
    pub dest_mantle_chain_id: u32,
    /// Arbitrum destination chain id.
    pub dest_arbitrum_chain_id: u32,
    /// Optimism destination chain id.
    pub dest_optimism_chain_id: u32,
    /// Base destination chain id.
    pub dest_base_chain_id: u32,
}

impl Default for CrossChainConfig {
    fn default() -> Self {
        Self {
            src_chain_id: 1,
            dest_bsc_chain_id: 2,
            dest_op_chain_id: 3,
            dest_polygon_chain_id: 4,
            dest_scroll_chain_id: 5,
            dest_linea_chain_id: 6,
            dest_mantle_chain_id: 7,
            dest_arbitrum_chain_id: 8,
            dest_optimism_chain_id: 9,
            dest_base_chain_id: 10,
        }
    }
}

/// Complete node configuration.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    /// Config-driven upgrade schedule: decimal height → plan.
    pub hardforks: BTreeMap<String, HardforkEntry>,
    /// Periodic payment invariant check.
    pub payment_check: PaymentCheck,
    /// Bridge peer identifiers.
    pub cross_chain: CrossChainConfig,
}

impl AppConfig {
    /// Validate operator-supplied settings.
    pub fn validate(&self) -> Result<(), String> {
        validate_hardforks(&self.hardforks)?;
        if self.cross_chain.src_chain_id == 0 {
            return Err("src chain id must be nonzero".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_hardfork_rejected() {
        let mut config = AppConfig::default();
        config.hardforks.insert(
            "not-a-number".to_string(),
            HardforkEntry { name: "v2".to_string(), info: String::new() },
        );
        assert!(config.validate().is_err());
    }
}
