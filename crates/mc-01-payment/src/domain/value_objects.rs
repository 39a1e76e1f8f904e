//! # Payment Value Objects

use serde::{Deserialize, Serialize};
use shared_types::{Address, FlowRate};

/// Stream record lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StreamStatus {
    /// Flows accrue normally.
    #[default]
    Active,
    /// Balance ran out; outflows are frozen until a resume deposit.
    Frozen,
}

/// OutFlow lifecycle, mirroring the owning stream record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutFlowStatus {
    /// Counted in the payer's netflow rate.
    #[default]
    Active,
    /// Counted in the payer's frozen netflow rate.
    Frozen,
}

impl OutFlowStatus {
    /// Stable key byte; frozen/active sets iterate separately.
    pub fn key_byte(self) -> u8 {
        match self {
            OutFlowStatus::Active => 0x01,
            OutFlowStatus::Frozen => 0x02,
        }
    }
}

/// A single account's pending rate and balance delta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecordChange {
    /// Target account.
    pub addr: Address,
    /// Signed netflow rate delta.
    pub rate_change: FlowRate,
    /// Signed static balance delta.
    pub static_balance_change: i128,
}

impl StreamRecordChange {
    /// Change with a rate delta only.
    pub fn rate(addr: Address, rate_change: FlowRate) -> Self {
        Self { addr, rate_change, static_balance_change: 0 }
    }

    /// Change with a static balance delta only.
    pub fn balance(addr: Address, static_balance_change: i128) -> Self {
        Self { addr, rate_change: 0, static_balance_change }
    }
}

/// A signed delta against a `(from, to)` outflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutFlowDelta {
    /// Recipient.
    pub to: Address,
    /// Signed rate delta; negative removes flow.
    pub rate: FlowRate,
}

/// All outflow deltas of one payer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFlows {
    /// Paying account.
    pub from: Address,
    /// Outflow deltas.
    pub flows: Vec<OutFlowDelta>,
}
