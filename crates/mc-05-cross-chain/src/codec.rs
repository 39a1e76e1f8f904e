//! # Package Codec
//!
//! ABI tuple decoding with an exactness guard: decoded tokens must
//! re-encode to the original bytes. Without the guard, a V2 payload
//! whose prefix happens to parse as a V1 tuple would be silently
//! accepted under a V1 opcode; with it, the mismatch is caught and the
//! node halts.

use ethabi::{decode, encode, ParamType, Token};
use shared_types::Uint;

/// True for V2 operation bytes (high bit set).
pub fn is_v2_op(op: u8) -> bool {
    op & 0x80 != 0
}

/// Ack status byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckStatus {
    /// Operation applied.
    Success,
    /// Operation rejected; state rolled back.
    Fail,
}

impl AckStatus {
    /// Wire byte.
    pub fn byte(self) -> u8 {
        match self {
            AckStatus::Success => 0,
            AckStatus::Fail => 1,
        }
    }

    /// Parse the wire byte.
    ///
    /// # Panics
    ///
    /// Panics on anything but 0 or 1.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => AckStatus::Success,
            1 => AckStatus::Fail,
            other => panic!("invalid ack status byte {other:#04x}"),
        }
    }
}

/// Wrap an ack: `op || status || id(32) || extra`, preserving the
/// request's operation byte (and with it the V1/V2 correspondence).
pub fn wrap_ack(op: u8, status: AckStatus, id: Uint, extra_data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(34 + extra_data.len());
    out.push(op);
    out.push(status.byte());
    let mut id_bytes = [0u8; 32];
    id.to_big_endian(&mut id_bytes);
    out.extend_from_slice(&id_bytes);
    out.extend_from_slice(extra_data);
    out
}

/// Split an ack payload (after the op byte) into status, id and extra.
///
/// # Panics
///
/// Panics on short payloads; a malformed ack is a protocol violation.
pub fn unwrap_ack(payload: &[u8]) -> (AckStatus, Uint, Vec<u8>) {
    if payload.len() < 33 {
        panic!("ack payload too short: {} bytes", payload.len());
    }
    let status = AckStatus::from_byte(payload[0]);
    let id = Uint::from_big_endian(&payload[1..33]);
    (status, id, payload[33..].to_vec())
}

/// Decode an ABI tuple and require the tokens to re-encode to exactly
/// the input bytes.
///
/// # Panics
///
/// Panics on decode failure or inexact round-trip: the payload does not
/// belong to this operation type and guessing would diverge.
pub fn decode_exact(types: &[ParamType], data: &[u8]) -> Vec<Token> {
    let tokens = decode(types, data)
        .unwrap_or_else(|e| panic!("malformed cross-chain package: {e}"));
    if encode(&tokens) != data {
        panic!("cross-chain package does not match operation format");
    }
    tokens
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ethabi::Token;

    #[test]
    fn test_version_bit() {
        assert!(!is_v2_op(0x01));
        assert!(!is_v2_op(0x7F));
        assert!(is_v2_op(0x80));
        assert!(is_v2_op(0x82));
    }

    #[test]
    fn test_ack_roundtrip() {
        let ack = wrap_ack(0x82, AckStatus::Fail, Uint::from(7u64), b"tail");
        assert_eq!(ack[0], 0x82);
        let (status, id, extra) = unwrap_ack(&ack[1..]);
        assert_eq!(status, AckStatus::Fail);
        assert_eq!(id, Uint::from(7u64));
        assert_eq!(extra, b"tail");
    }

    #[test]
    fn test_decode_exact_roundtrip() {
        let types = [ParamType::Address, ParamType::Uint(256)];
        let data = encode(&[
            Token::Address([0x11; 20].into()),
            Token::Uint(42u64.into()),
        ]);
        let tokens = decode_exact(&types, &data);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    #[should_panic(expected = "cross-chain package")]
    fn test_decode_exact_rejects_excess_tail() {
        // A longer tuple's encoding must not pass as the shorter tuple
        let data = encode(&[
            Token::Address([0x11; 20].into()),
            Token::Uint(42u64.into()),
            Token::Uint(7u64.into()),
        ]);
        decode_exact(&[ParamType::Address, ParamType::Uint(256)], &data);
    }
}
