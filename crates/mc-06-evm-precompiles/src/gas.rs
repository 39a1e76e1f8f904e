//! # Dynamic Gas Formulas
//!
//! Base gas plus an arity surcharge, each component capped. The swap
//! formulas match the virtual-group engine's message bounds: 50 groups
//! per swap call.

/// Base and per-item costs.
pub mod costs {
    /// Flat cost of any adapter call.
    pub const BASE: u64 = 21_000;

    // SubmitProposal
    /// Per inner message.
    pub const PER_MSG: u64 = 10_000;
    /// Per payload byte.
    pub const PER_BYTE: u64 = 16;
    /// Inner messages counted at most.
    pub const MAX_MSGS: u64 = 16;
    /// Payload bytes counted at most.
    pub const MAX_BYTES: u64 = 65_536;

    // PutPolicy
    /// Per statement.
    pub const PER_STATEMENT: u64 = 8_000;
    /// Per action across all statements.
    pub const PER_ACTION: u64 = 1_000;
    /// Per resource across all statements.
    pub const PER_RESOURCE: u64 = 1_000;
    /// Statements counted at most.
    pub const MAX_STATEMENTS: u64 = 10;
    /// Actions counted at most.
    pub const MAX_ACTIONS: u64 = 100;
    /// Resources counted at most.
    pub const MAX_RESOURCES: u64 = 100;

    // Group membership
    /// Per renewed member.
    pub const PER_MEMBER: u64 = 5_000;
    /// Renewals counted at most.
    pub const MAX_RENEW: u64 = 100;
    /// Adds-plus-removes counted at most.
    pub const MAX_UPDATE: u64 = 100;

    // DiscontinueObject
    /// Per discontinued id.
    pub const PER_ID: u64 = 4_000;
    /// Ids counted at most.
    pub const MAX_IDS: u64 = 128;

    // SwapOut / CompleteSwapOut
    /// Flat swap cost.
    pub const SWAP_BASE: u64 = 60_000;
    /// Per swapped group.
    pub const SWAP_PER_GVG: u64 = 20_000;
    /// Groups counted at most (message bound).
    pub const SWAP_MAX_GVGS: u64 = 50;
}

use costs::*;

/// `base + perMsg·min(numMsgs, MaxMsgs) + perByte·min(payloadSize, MaxBytes)`
pub fn submit_proposal_gas(num_msgs: u64, payload_size: u64) -> u64 {
    BASE + PER_MSG * num_msgs.min(MAX_MSGS) + PER_BYTE * payload_size.min(MAX_BYTES)
}

/// `base + perStmt·N + perAction·ΣA + perResource·ΣR`, each capped.
pub fn put_policy_gas(statements: u64, total_actions: u64, total_resources: u64) -> u64 {
    BASE + PER_STATEMENT * statements.min(MAX_STATEMENTS)
        + PER_ACTION * total_actions.min(MAX_ACTIONS)
        + PER_RESOURCE * total_resources.min(MAX_RESOURCES)
}

/// `base + perMember·min(M, MaxRenew)`
pub fn renew_group_member_gas(members: u64) -> u64 {
    BASE + PER_MEMBER * members.min(MAX_RENEW)
}

/// `base + perMember·min(|add|+|del|, MaxUpdate)`
pub fn update_group_gas(adds: u64, removes: u64, ) -> u64 {
    BASE + PER_MEMBER * (adds + removes).min(MAX_UPDATE)
}

/// `base + perId·min(|ids|, MaxIds)`
pub fn discontinue_object_gas(ids: u64) -> u64 {
    BASE + PER_ID * ids.min(MAX_IDS)
}

/// `60_000 + 20_000·|gvgIds|` with the 50-group message bound.
pub fn swap_out_gas(gvg_count: u64) -> u64 {
    SWAP_BASE + SWAP_PER_GVG * gvg_count.min(SWAP_MAX_GVGS)
}

/// Symmetric with [`swap_out_gas`].
pub fn complete_swap_out_gas(gvg_count: u64) -> u64 {
    swap_out_gas(gvg_count)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_out_formula() {
        assert_eq!(swap_out_gas(1), 80_000);
        assert_eq!(swap_out_gas(50), 60_000 + 20_000 * 50);
        // Above the message bound the surcharge stops growing
        assert_eq!(swap_out_gas(51), swap_out_gas(50));
        assert_eq!(complete_swap_out_gas(3), swap_out_gas(3));
    }

    #[test]
    fn test_submit_proposal_caps() {
        assert_eq!(submit_proposal_gas(2, 100), BASE + 2 * PER_MSG + 100 * PER_BYTE);
        assert_eq!(
            submit_proposal_gas(1_000, 10_000_000),
            BASE + MAX_MSGS * PER_MSG + MAX_BYTES * PER_BYTE
        );
    }

    #[test]
    fn test_put_policy_components() {
        assert_eq!(
            put_policy_gas(2, 5, 3),
            BASE + 2 * PER_STATEMENT + 5 * PER_ACTION + 3 * PER_RESOURCE
        );
        // Each component caps independently
        assert_eq!(
            put_policy_gas(100, 1_000, 1_000),
            BASE + MAX_STATEMENTS * PER_STATEMENT
                + MAX_ACTIONS * PER_ACTION
                + MAX_RESOURCES * PER_RESOURCE
        );
    }

    #[test]
    fn test_membership_formulas() {
        assert_eq!(renew_group_member_gas(4), BASE + 4 * PER_MEMBER);
        assert_eq!(update_group_gas(3, 2), BASE + 5 * PER_MEMBER);
        assert_eq!(update_group_gas(80, 80), BASE + MAX_UPDATE * PER_MEMBER);
        assert_eq!(discontinue_object_gas(6), BASE + 6 * PER_ID);
    }
}
