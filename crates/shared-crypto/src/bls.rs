//! # BLS Verification (BLS12-381)
//!
//! Object seals carry a signature aggregated across the secondary SPs of
//! a global virtual group; all signers sign the same message. SP
//! registration carries a key-possession proof: a self-signature over
//! `tmhash(pubkey)`.
//!
//! ## Implementation Details
//!
//! - min-pk variant: public keys on G1 (48 bytes), signatures on G2
//!   (96 bytes)
//! - Votepool domain separation tag, hash-to-curve per RFC 9380

use crate::errors::CryptoError;
use crate::hashing::tmhash;
use blst::min_pk::{PublicKey, Signature};
use blst::BLST_ERROR;
use serde::{Deserialize, Serialize};

/// Domain Separation Tag used by the votepool signature scheme.
pub const VOTEPOOL_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// Compressed G1 public key (48 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsPublicKey {
    /// Compressed point bytes.
    #[serde(with = "serde_bytes_48")]
    pub bytes: [u8; 48],
}

impl std::fmt::Debug for BlsPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlsPublicKey({})", hex::encode(self.bytes))
    }
}

/// Compressed G2 signature (96 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsSignature {
    /// Compressed point bytes.
    #[serde(with = "serde_bytes_96")]
    pub bytes: [u8; 96],
}

impl std::fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlsSignature({})", hex::encode(&self.bytes[..8]))
    }
}

impl BlsPublicKey {
    /// Parse from a slice; fails unless exactly 48 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 48] = bytes.try_into().map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { bytes: arr })
    }
}

impl BlsSignature {
    /// Parse from a slice; fails unless exactly 96 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 96] = bytes.try_into().map_err(|_| CryptoError::InvalidFormat)?;
        Ok(Self { bytes: arr })
    }
}

/// Verify a single BLS signature.
pub fn verify_bls(message: &[u8], signature: &BlsSignature, public_key: &BlsPublicKey) -> bool {
    let Ok(sig) = Signature::from_bytes(&signature.bytes) else {
        return false;
    };
    let Ok(pk) = PublicKey::from_bytes(&public_key.bytes) else {
        return false;
    };
    sig.verify(true, message, VOTEPOOL_DST, &[], &pk, true) == BLST_ERROR::BLST_SUCCESS
}

/// Verify an aggregated BLS signature where all signers signed `message`.
pub fn verify_bls_aggregate(
    message: &[u8],
    aggregate_signature: &BlsSignature,
    public_keys: &[BlsPublicKey],
) -> bool {
    if public_keys.is_empty() {
        return false;
    }
    let sig = match Signature::from_bytes(&aggregate_signature.bytes) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let pks: Vec<PublicKey> = public_keys
        .iter()
        .filter_map(|pk| PublicKey::from_bytes(&pk.bytes).ok())
        .collect();
    if pks.len() != public_keys.len() {
        return false;
    }
    let pk_refs: Vec<&PublicKey> = pks.iter().collect();
    let msgs: Vec<&[u8]> = vec![message; pk_refs.len()];
    sig.aggregate_verify(true, &msgs, VOTEPOOL_DST, &pk_refs, true) == BLST_ERROR::BLST_SUCCESS
}

/// Verify an SP's key-possession proof: `sign(proof, tmhash(pubkey))`.
pub fn verify_possession_proof(
    public_key: &BlsPublicKey,
    proof: &BlsSignature,
) -> Result<(), CryptoError> {
    let digest = tmhash(&public_key.bytes);
    if verify_bls(&digest, proof, public_key) {
        Ok(())
    } else {
        Err(CryptoError::BlsVerificationFailed)
    }
}

mod serde_bytes_48 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 48], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 48], D::Error> {
        let v: Vec<u8> = Vec::deserialize(d)?;
        v.try_into().map_err(|_| serde::de::Error::custom("expected 48 bytes"))
    }
}

mod serde_bytes_96 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 96], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 96], D::Error> {
        let v: Vec<u8> = Vec::deserialize(d)?;
        v.try_into().map_err(|_| serde::de::Error::custom("expected 96 bytes"))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use blst::min_pk::SecretKey;

    fn keygen(seed: u8) -> SecretKey {
        let ikm = [seed; 32];
        SecretKey::key_gen(&ikm, &[]).unwrap()
    }

    fn pk_of(sk: &SecretKey) -> BlsPublicKey {
        BlsPublicKey { bytes: sk.sk_to_pk().to_bytes() }
    }

    fn sign(sk: &SecretKey, msg: &[u8]) -> BlsSignature {
        BlsSignature { bytes: sk.sign(msg, VOTEPOOL_DST, &[]).to_bytes() }
    }

    #[test]
    fn test_single_verify() {
        let sk = keygen(1);
        let sig = sign(&sk, b"seal");
        assert!(verify_bls(b"seal", &sig, &pk_of(&sk)));
        assert!(!verify_bls(b"other", &sig, &pk_of(&sk)));
    }

    #[test]
    fn test_aggregate_verify() {
        use blst::min_pk::AggregateSignature;
        let sks: Vec<SecretKey> = (1..=4).map(keygen).collect();
        let msg = b"bucket|object|checksums";
        let sigs: Vec<blst::min_pk::Signature> = sks
            .iter()
            .map(|sk| sk.sign(msg, VOTEPOOL_DST, &[]))
            .collect();
        let sig_refs: Vec<&blst::min_pk::Signature> = sigs.iter().collect();
        let agg = AggregateSignature::aggregate(&sig_refs, true).unwrap();
        let agg_sig = BlsSignature { bytes: agg.to_signature().to_bytes() };
        let pks: Vec<BlsPublicKey> = sks.iter().map(pk_of).collect();

        assert!(verify_bls_aggregate(msg, &agg_sig, &pks));
        // Dropping one signer must fail the pairing check
        assert!(!verify_bls_aggregate(msg, &agg_sig, &pks[..3]));
        // Empty signer set never verifies
        assert!(!verify_bls_aggregate(msg, &agg_sig, &[]));
    }

    #[test]
    fn test_possession_proof() {
        let sk = keygen(9);
        let pk = pk_of(&sk);
        let proof = sign(&sk, &tmhash(&pk.bytes));
        assert!(verify_possession_proof(&pk, &proof).is_ok());

        let wrong = sign(&sk, b"not the key digest");
        assert_eq!(
            verify_possession_proof(&pk, &wrong),
            Err(CryptoError::BlsVerificationFailed)
        );
    }
}
