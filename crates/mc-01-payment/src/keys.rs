//! # Payment Store Keys
//!
//! All keys live under the payment namespace byte. OutFlows embed the
//! status byte before the recipient so the frozen and active sets scan
//! separately and in recipient order.

use crate::domain::value_objects::OutFlowStatus;
use shared_store::kv::namespaces;
use shared_types::Address;

const STREAM_RECORD: u8 = 0x01;
const OUT_FLOW: u8 = 0x02;
const AUTO_SETTLE: u8 = 0x03;
const PARAMS: u8 = 0x04;
const PAYMENT_ACCOUNT: u8 = 0x05;
const PAYMENT_ACCOUNT_COUNT: u8 = 0x06;

/// Stream record by account.
pub fn stream_record_key(addr: Address) -> Vec<u8> {
    let mut key = vec![namespaces::PAYMENT, STREAM_RECORD];
    key.extend_from_slice(addr.as_bytes());
    key
}

/// Prefix of every stream record (invariant scans).
pub fn stream_record_prefix() -> Vec<u8> {
    vec![namespaces::PAYMENT, STREAM_RECORD]
}

/// OutFlow by `(from, status, to)`.
pub fn out_flow_key(from: Address, status: OutFlowStatus, to: Address) -> Vec<u8> {
    let mut key = out_flow_status_prefix(from, status);
    key.extend_from_slice(to.as_bytes());
    key
}

/// Prefix of one payer's outflows in one status, ordered by recipient.
pub fn out_flow_status_prefix(from: Address, status: OutFlowStatus) -> Vec<u8> {
    let mut key = vec![namespaces::PAYMENT, OUT_FLOW];
    key.extend_from_slice(from.as_bytes());
    key.push(status.key_byte());
    key
}

/// Auto-settle queue entry `(deadline, account)`.
pub fn auto_settle_key(deadline: i64, addr: Address) -> Vec<u8> {
    let mut key = vec![namespaces::PAYMENT, AUTO_SETTLE];
    key.extend_from_slice(&(deadline as u64).to_be_bytes());
    key.extend_from_slice(addr.as_bytes());
    key
}

/// Prefix of the auto-settle queue, ordered by deadline.
pub fn auto_settle_prefix() -> Vec<u8> {
    vec![namespaces::PAYMENT, AUTO_SETTLE]
}

/// Governance parameters.
pub fn params_key() -> Vec<u8> {
    vec![namespaces::PAYMENT, PARAMS]
}

/// Payment account metadata by address.
pub fn payment_account_key(addr: Address) -> Vec<u8> {
    let mut key = vec![namespaces::PAYMENT, PAYMENT_ACCOUNT];
    key.extend_from_slice(addr.as_bytes());
    key
}

/// Per-owner payment account counter.
pub fn payment_account_count_key(owner: Address) -> Vec<u8> {
    let mut key = vec![namespaces::PAYMENT, PAYMENT_ACCOUNT_COUNT];
    key.extend_from_slice(owner.as_bytes());
    key
}
