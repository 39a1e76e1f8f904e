//! # shared-crypto
//!
//! Cryptographic primitives for Moca-Chain.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256, SHA-256 (tmhash) | Approval digests, key digests |
//! | `ecdsa` | secp256k1 recover + compare | SP approval signatures |
//! | `bls` | BLS12-381 aggregate (min-pk) | Object seals, possession proofs |
//!
//! ## Security Properties
//!
//! - **secp256k1**: low-S normalization enforced (EIP-2), scalar range
//!   validation, constant-time address comparison
//! - **BLS12-381**: pairing checks with group validation, votepool DST

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bls;
pub mod ecdsa;
pub mod errors;
pub mod hashing;

pub use bls::{
    verify_bls, verify_bls_aggregate, verify_possession_proof, BlsPublicKey, BlsSignature,
    VOTEPOOL_DST,
};
pub use ecdsa::{recover_address, verify_signer, EcdsaSignature};
pub use errors::CryptoError;
pub use hashing::{keccak256, tmhash};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
