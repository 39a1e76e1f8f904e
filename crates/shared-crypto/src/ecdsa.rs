//! # ECDSA Approval Signatures (secp256k1)
//!
//! Storage-provider approvals are 65-byte Ethereum-style signatures
//! `r || s || v` over a keccak256 digest. Verification recovers the
//! signer and compares it against the SP's registered approval address.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: S must be in the lower half of
//!   the curve order
//! - **Scalar Range Validation**: R and S must be in [1, n-1]
//! - **Constant-Time Comparison**: recovered addresses compare via
//!   `subtle` to resist side channels

use crate::errors::CryptoError;
use crate::hashing::keccak256;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use shared_types::{Address, Hash};
use subtle::ConstantTimeEq;

/// Half of the secp256k1 curve order (for the low-S malleability check).
/// n/2 where n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// A 65-byte recoverable signature `r || s || v`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EcdsaSignature {
    /// R scalar.
    pub r: [u8; 32],
    /// S scalar.
    pub s: [u8; 32],
    /// Recovery id (0, 1, 27 or 28).
    pub v: u8,
}

impl EcdsaSignature {
    /// Parse from the 65-byte wire form.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 65 {
            return Err(CryptoError::InvalidFormat);
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    /// Serialize back to the 65-byte wire form.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    fn recovery_id(&self) -> Result<RecoveryId, CryptoError> {
        let normalized = match self.v {
            0 | 1 => self.v,
            27 | 28 => self.v - 27,
            _ => return Err(CryptoError::InvalidFormat),
        };
        RecoveryId::from_byte(normalized).ok_or(CryptoError::InvalidFormat)
    }
}

/// Recover the signer's address from a signature over `digest`.
///
/// Enforces low-S (EIP-2) before recovery; a high-S signature is rejected
/// rather than normalized, the same bytes must verify on every node.
pub fn recover_address(digest: &Hash, signature: &EcdsaSignature) -> Result<Address, CryptoError> {
    if is_zero(&signature.r) || is_zero(&signature.s) {
        return Err(CryptoError::InvalidFormat);
    }
    if gt(&signature.s, &SECP256K1_HALF_ORDER) {
        return Err(CryptoError::InvalidFormat);
    }

    let mut sig_bytes = [0u8; 64];
    sig_bytes[0..32].copy_from_slice(&signature.r);
    sig_bytes[32..64].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| CryptoError::InvalidFormat)?;
    let recid = signature.recovery_id()?;

    let key = VerifyingKey::recover_from_prehash(digest, &sig, recid)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    // Ethereum address = last 20 bytes of keccak256(uncompressed pubkey sans tag)
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Ok(Address::new(addr))
}

/// Verify that `signature` over `digest` was produced by `expected`.
pub fn verify_signer(
    digest: &Hash,
    signature: &EcdsaSignature,
    expected: Address,
) -> Result<(), CryptoError> {
    let recovered = recover_address(digest, signature)?;
    if recovered.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(CryptoError::SignerMismatch)
    }
}

fn is_zero(scalar: &[u8; 32]) -> bool {
    scalar.iter().all(|b| *b == 0)
}

/// Big-endian `a > b`.
fn gt(a: &[u8; 32], b: &[u8; 32]) -> bool {
    for i in 0..32 {
        if a[i] != b[i] {
            return a[i] > b[i];
        }
    }
    false
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use rand::rngs::OsRng;

    fn address_of(key: &SigningKey) -> Address {
        let point = key.verifying_key().to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash[12..32]);
        Address::new(addr)
    }

    fn sign_digest(key: &SigningKey, digest: &Hash) -> EcdsaSignature {
        let (sig, recid) = key.sign_prehash_recoverable(digest).unwrap();
        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        EcdsaSignature { r, s, v: recid.to_byte() }
    }

    #[test]
    fn test_recover_matches_signer() {
        let key = SigningKey::random(&mut OsRng);
        let digest = keccak256(b"approval message");
        let sig = sign_digest(&key, &digest);
        assert_eq!(recover_address(&digest, &sig).unwrap(), address_of(&key));
    }

    #[test]
    fn test_verify_signer_mismatch() {
        let key = SigningKey::random(&mut OsRng);
        let other = SigningKey::random(&mut OsRng);
        let digest = keccak256(b"approval message");
        let sig = sign_digest(&key, &digest);
        assert_eq!(
            verify_signer(&digest, &sig, address_of(&other)),
            Err(CryptoError::SignerMismatch)
        );
    }

    #[test]
    fn test_rejects_zero_scalars() {
        let digest = keccak256(b"x");
        let sig = EcdsaSignature { r: [0u8; 32], s: [1u8; 32], v: 0 };
        assert_eq!(recover_address(&digest, &sig), Err(CryptoError::InvalidFormat));
    }

    #[test]
    fn test_rejects_high_s() {
        let mut s = SECP256K1_HALF_ORDER;
        s[31] = s[31].wrapping_add(1);
        let sig = EcdsaSignature { r: [1u8; 32], s, v: 0 };
        let digest = keccak256(b"x");
        assert_eq!(recover_address(&digest, &sig), Err(CryptoError::InvalidFormat));
    }

    #[test]
    fn test_wire_roundtrip() {
        let key = SigningKey::random(&mut OsRng);
        let digest = keccak256(b"wire");
        let sig = sign_digest(&key, &digest);
        assert_eq!(EcdsaSignature::from_slice(&sig.to_bytes()).unwrap(), sig);
    }
}
