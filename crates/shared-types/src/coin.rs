//! # Coins and Flow Rates
//!
//! Balances are denominated `Coin { denom, amount }` with U256 amounts.
//! Stream payment rates are signed (`FlowRate`): positive means inflow,
//! negative outflow.

use crate::ids::Uint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token denomination.
pub type Denom = String;

/// Signed per-second flow rate used by stream payment accounting.
pub type FlowRate = i128;

/// An amount of a single denomination.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Coin {
    /// Denomination.
    pub denom: Denom,
    /// Amount.
    pub amount: Uint,
}

impl Coin {
    /// Construct a coin.
    pub fn new(denom: impl Into<Denom>, amount: Uint) -> Self {
        Self { denom: denom.into(), amount }
    }

    /// Zero-amount coin of a denom.
    pub fn zero(denom: impl Into<Denom>) -> Self {
        Self { denom: denom.into(), amount: Uint::zero() }
    }

    /// True if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Debug for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_zero() {
        let c = Coin::zero("umoca");
        assert!(c.is_zero());
        assert_eq!(format!("{c:?}"), "0umoca");
    }
}
