//! # Payment Invariants
//!
//! Checked by the lifecycle controller's periodic payment check. Each
//! returns true when the committed state satisfies the property.

use super::entities::{OutFlow, StreamRecord};
use super::value_objects::{OutFlowStatus, StreamStatus};
use crate::keys;
use shared_store::KvRead;
use shared_types::Address;

/// `-netflow_rate` equals the sum of active outflow rates, and
/// `-frozen_netflow_rate` the sum of frozen ones, for the payer side.
/// Pure recipients have no outflows and pass trivially.
#[must_use]
pub fn check_outflow_consistency(store: &dyn KvRead, record: &StreamRecord) -> bool {
    let active_sum: i128 = sum_rates(store, record.account, OutFlowStatus::Active);
    let frozen_sum: i128 = sum_rates(store, record.account, OutFlowStatus::Frozen);
    let active_ok = active_sum == 0 || -record.netflow_rate == active_sum;
    let frozen_ok = frozen_sum == 0 || -record.frozen_netflow_rate == frozen_sum;
    active_ok && frozen_ok
}

/// An ACTIVE record never runs a negative total balance.
#[must_use]
pub fn check_active_balance(record: &StreamRecord) -> bool {
    record.status != StreamStatus::Active || record.total_balance() >= 0
}

/// The sum of all netflow rates over all stream records is zero.
#[must_use]
pub fn check_global_netflow_zero(store: &dyn KvRead) -> bool {
    let mut sum: i128 = 0;
    for (_, bytes) in store.scan_prefix(&keys::stream_record_prefix()) {
        let record: StreamRecord = bincode::deserialize(&bytes)
            .unwrap_or_else(|e| panic!("corrupt stream record: {e}"));
        sum += record.netflow_rate;
    }
    sum == 0
}

fn sum_rates(store: &dyn KvRead, from: Address, status: OutFlowStatus) -> i128 {
    store
        .scan_prefix(&keys::out_flow_status_prefix(from, status))
        .into_iter()
        .map(|(_, bytes)| {
            let flow: OutFlow = bincode::deserialize(&bytes)
                .unwrap_or_else(|e| panic!("corrupt outflow record: {e}"));
            flow.rate as i128
        })
        .sum()
}
