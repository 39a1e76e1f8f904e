//! # SP Registry Errors

use shared_types::{Address, SpId};
use thiserror::Error;

/// Registry failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpError {
    /// Message signer is not the governance authority.
    #[error("unauthorized: expected authority {expected}")]
    Unauthorized {
        /// Configured authority.
        expected: Address,
    },

    /// An address field is already claimed by another SP.
    #[error("duplicate {field} address {addr}")]
    DuplicateAddress {
        /// Which field collided.
        field: &'static str,
        /// The colliding address.
        addr: Address,
    },

    /// The BLS public key is already claimed.
    #[error("duplicate bls public key")]
    DuplicateBlsKey,

    /// The BLS possession proof did not verify.
    #[error("invalid bls key possession proof")]
    InvalidBlsProof,

    /// Deposit below the configured minimum.
    #[error("deposit too low: {got} < {min}")]
    DepositTooLow {
        /// Offered deposit.
        got: u128,
        /// Minimum.
        min: u128,
    },

    /// Deposit denom does not match the configured denom.
    #[error("invalid deposit denom: {got}, expected {expected}")]
    DepositDenomMismatch {
        /// Offered denom.
        got: String,
        /// Configured denom.
        expected: String,
    },

    /// Funding account cannot cover the deposit.
    #[error("insufficient funding balance for deposit")]
    InsufficientFunding,

    /// Endpoint is not an http(s) URL with a host.
    #[error("invalid endpoint: {endpoint}")]
    InvalidEndpoint {
        /// Offending endpoint string.
        endpoint: String,
    },

    /// No SP under the queried id or address.
    #[error("storage provider not found")]
    NotFound,

    /// Edit message changed nothing.
    #[error("storage provider not changed")]
    StorageProviderNotChanged,

    /// Operation is invalid in the SP's current status.
    #[error("invalid status for sp {sp_id}")]
    InvalidStatus {
        /// The SP.
        sp_id: SpId,
    },
}
