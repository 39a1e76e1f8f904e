//! # Payment Errors

use shared_types::Address;
use thiserror::Error;

/// Payment failures. All are fatal to the enclosing message; the cache
/// context rolls the message back so no deduction survives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// Account cannot fund the required reserve buffer.
    #[error("balance not enough: account {account} short by {shortfall}")]
    BalanceNotEnough {
        /// The underfunded account.
        account: Address,
        /// Missing amount.
        shortfall: u128,
    },

    /// A frozen stream record was mutated without the force-update flag.
    #[error("stream record {account} is frozen")]
    Frozen {
        /// The frozen account.
        account: Address,
    },

    /// Stream record does not exist.
    #[error("stream record not found: {account}")]
    StreamRecordNotFound {
        /// Queried account.
        account: Address,
    },

    /// An outflow delta would drive a flow rate negative.
    #[error("outflow underflow: from {from} to {to}")]
    OutFlowUnderflow {
        /// Payer.
        from: Address,
        /// Recipient.
        to: Address,
    },

    /// Withdrawal larger than the settled static balance.
    #[error("insufficient static balance: account {account}")]
    InsufficientStaticBalance {
        /// The account.
        account: Address,
    },

    /// Owner reached the payment account creation cap.
    #[error("payment account limit exceeded: {current}/{limit}")]
    PaymentAccountLimit {
        /// Current count.
        current: u64,
        /// Configured cap.
        limit: u64,
    },

    /// Payment account is not refundable.
    #[error("payment account {account} is not refundable")]
    NotRefundable {
        /// The account.
        account: Address,
    },
}
