//! # Flow Algebra
//!
//! Pure merging over change lists. Everything here is deterministic and
//! idempotent: merging a merged list yields the same list, which is what
//! lets handlers compose change sets freely before applying them once.

use super::value_objects::{OutFlowDelta, StreamRecordChange, UserFlows};
use std::collections::BTreeMap;

/// Merge changes by address (lexicographic), summing rate and balance
/// deltas. Entries that cancel to zero on both axes are dropped.
pub fn merge_stream_record_changes(changes: Vec<StreamRecordChange>) -> Vec<StreamRecordChange> {
    let mut merged: BTreeMap<[u8; 20], (i128, i128)> = BTreeMap::new();
    for change in changes {
        let entry = merged.entry(*change.addr.as_bytes()).or_insert((0, 0));
        entry.0 += change.rate_change;
        entry.1 += change.static_balance_change;
    }
    merged
        .into_iter()
        .filter(|(_, (rate, balance))| *rate != 0 || *balance != 0)
        .map(|(addr, (rate_change, static_balance_change))| StreamRecordChange {
            addr: shared_types::Address::new(addr),
            rate_change,
            static_balance_change,
        })
        .collect()
}

/// Deduplicate outflow deltas by recipient, summing rates and dropping
/// zero-rate entries. Output is sorted by recipient address.
pub fn merge_outflows(flows: Vec<OutFlowDelta>) -> Vec<OutFlowDelta> {
    let mut merged: BTreeMap<[u8; 20], i128> = BTreeMap::new();
    for flow in flows {
        *merged.entry(*flow.to.as_bytes()).or_insert(0) += flow.rate;
    }
    merged
        .into_iter()
        .filter(|(_, rate)| *rate != 0)
        .map(|(to, rate)| OutFlowDelta { to: shared_types::Address::new(to), rate })
        .collect()
}

/// Merge per-from flow lists: group by payer (sorted), then merge each
/// payer's deltas with [`merge_outflows`].
pub fn merge_user_flows(user_flows: Vec<UserFlows>) -> Vec<UserFlows> {
    let mut merged: BTreeMap<[u8; 20], Vec<OutFlowDelta>> = BTreeMap::new();
    for uf in user_flows {
        merged.entry(*uf.from.as_bytes()).or_default().extend(uf.flows);
    }
    merged
        .into_iter()
        .map(|(from, flows)| UserFlows {
            from: shared_types::Address::new(from),
            flows: merge_outflows(flows),
        })
        .filter(|uf| !uf.flows.is_empty())
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Address;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_merge_changes_sums_and_sorts() {
        let changes = vec![
            StreamRecordChange { addr: addr(2), rate_change: 5, static_balance_change: 0 },
            StreamRecordChange { addr: addr(1), rate_change: -3, static_balance_change: 10 },
            StreamRecordChange { addr: addr(2), rate_change: 7, static_balance_change: -1 },
        ];
        let merged = merge_stream_record_changes(changes);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].addr, addr(1));
        assert_eq!(merged[1].rate_change, 12);
        assert_eq!(merged[1].static_balance_change, -1);
    }

    #[test]
    fn test_merge_changes_drops_cancelled() {
        let changes = vec![
            StreamRecordChange { addr: addr(1), rate_change: 5, static_balance_change: 2 },
            StreamRecordChange { addr: addr(1), rate_change: -5, static_balance_change: -2 },
        ];
        assert!(merge_stream_record_changes(changes).is_empty());
    }

    #[test]
    fn test_merge_outflows_dedupes() {
        let flows = vec![
            OutFlowDelta { to: addr(3), rate: 4 },
            OutFlowDelta { to: addr(2), rate: 1 },
            OutFlowDelta { to: addr(3), rate: -4 },
        ];
        let merged = merge_outflows(flows);
        assert_eq!(merged, vec![OutFlowDelta { to: addr(2), rate: 1 }]);
    }

    #[test]
    fn test_merge_user_flows_idempotent() {
        let input = vec![
            UserFlows {
                from: addr(1),
                flows: vec![
                    OutFlowDelta { to: addr(2), rate: 3 },
                    OutFlowDelta { to: addr(3), rate: 5 },
                ],
            },
            UserFlows { from: addr(1), flows: vec![OutFlowDelta { to: addr(2), rate: 2 }] },
            UserFlows { from: addr(4), flows: vec![OutFlowDelta { to: addr(2), rate: 9 }] },
        ];
        let once = merge_user_flows(input);
        let twice = merge_user_flows(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once[0].flows[0].rate, 5);
    }
}
