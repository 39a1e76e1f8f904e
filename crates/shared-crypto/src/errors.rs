//! # Crypto Errors

use thiserror::Error;

/// Errors surfaced by signature verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature bytes are malformed (length, scalar range, recovery id).
    #[error("invalid signature format")]
    InvalidFormat,

    /// Public key bytes do not decode to a valid curve point.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Recovery produced no valid public key.
    #[error("signature recovery failed")]
    RecoveryFailed,

    /// Recovered signer does not match the expected address.
    #[error("signer mismatch")]
    SignerMismatch,

    /// Pairing check rejected the signature.
    #[error("bls verification failed")]
    BlsVerificationFailed,

    /// Aggregation over an empty signer set.
    #[error("empty aggregation")]
    EmptyAggregation,
}
