//! # Module Ordering
//!
//! Begin/end-block order is consensus-critical: every node must run the
//! hooks in the same sequence. The fee market closes the end-block so
//! it observes the block's final gas usage.

/// Begin-block order.
pub const BEGIN_BLOCK_ORDER: [&str; 23] = [
    "capability",
    "epochs",
    "feemarket",
    "evm",
    "distribution",
    "slashing",
    "evidence",
    "staking",
    "ibc",
    "crisis",
    "authz",
    "feegrant",
    "crosschain",
    "oracle",
    "bridge",
    "gashub",
    "sp",
    "virtualgroup",
    "payment",
    "permission",
    "storage",
    "gensp",
    "challenge",
];

/// End-block order; fee market last.
pub const END_BLOCK_ORDER: [&str; 16] = [
    "crisis",
    "gov",
    "staking",
    "ibc",
    "crosschain",
    "oracle",
    "bridge",
    "gashub",
    "sp",
    "virtualgroup",
    "payment",
    "permission",
    "storage",
    "challenge",
    "evm",
    "feemarket",
];

// =============================================================================
// TESTS
// =============================================================================
