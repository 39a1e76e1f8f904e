//! # Payment Entities

use super::value_objects::{OutFlowStatus, StreamStatus};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Denom, FlowRate};

/// Per-account continuous-rate ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// Owning account.
    pub account: Address,
    /// Signed net rate; negative means the account pays out.
    pub netflow_rate: FlowRate,
    /// Net rate of frozen outflows (payer side only).
    pub frozen_netflow_rate: FlowRate,
    /// Settled balance; may dip negative between settlements.
    pub static_balance: i128,
    /// Reserve covering `|netflow| · reserve_time` of future outflow.
    pub buffer_balance: u128,
    /// Funds locked for unsealed objects.
    pub lock_balance: u128,
    /// Unix seconds of the last settlement.
    pub settle_timestamp: i64,
    /// Lifecycle status.
    pub status: StreamStatus,
    /// Number of live outflow records (active + frozen).
    pub out_flow_count: u64,
}

impl StreamRecord {
    /// Fresh record for `account` settled at `now`.
    pub fn new(account: Address, now: i64) -> Self {
        Self {
            account,
            netflow_rate: 0,
            frozen_netflow_rate: 0,
            static_balance: 0,
            buffer_balance: 0,
            lock_balance: 0,
            settle_timestamp: now,
            status: StreamStatus::Active,
            out_flow_count: 0,
        }
    }

    /// Total spendable balance (static + buffer), may be negative.
    pub fn total_balance(&self) -> i128 {
        self.static_balance + self.buffer_balance as i128
    }
}

/// A persisted outflow record; `from` and `status` live in the key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutFlow {
    /// Recipient address.
    pub to: Address,
    /// Positive rate.
    pub rate: u128,
    /// Lifecycle status.
    pub status: OutFlowStatus,
}

/// A payment account created under an owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAccount {
    /// Account address (derived from owner + index).
    pub addr: Address,
    /// Owning account.
    pub owner: Address,
    /// Whether the owner may withdraw from it.
    pub refundable: bool,
}

/// Governance parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentParams {
    /// Seconds of outflow the buffer must cover.
    pub reserve_time: u64,
    /// Grace seconds before an exhausted account is force-settled.
    pub forced_settle_time: u64,
    /// Payment accounts an owner may create.
    pub payment_account_count_limit: u64,
    /// Outflows one auto-settle pass may freeze.
    pub max_auto_settle_flow_count: u64,
    /// Outflows one resume pass may thaw.
    pub max_auto_resume_flow_count: u64,
    /// Fee denomination.
    pub fee_denom: Denom,
}

impl Default for PaymentParams {
    fn default() -> Self {
        Self {
            reserve_time: 180 * 24 * 60 * 60,
            forced_settle_time: 24 * 60 * 60,
            payment_account_count_limit: 200,
            max_auto_settle_flow_count: 100,
            max_auto_resume_flow_count: 100,
            fee_denom: "umoca".to_string(),
        }
    }
}
