//! # Event Topic Encoding
//!
//! Address-indexed fields left-pad the raw 20 bytes into the 32-byte
//! topic word. String-indexed fields hash keccak256 over the UTF-8
//! bytes. Bech32 validator strings are parsed to raw bytes first and
//! then padded like any other address; a string never goes through a
//! hex parse.

use shared_crypto::keccak256;
use shared_types::{Address, Hash};

/// 32-byte topic from a 20-byte address: left-padded raw bytes.
pub fn address_topic(addr: Address) -> Hash {
    let mut topic = [0u8; 32];
    topic[12..32].copy_from_slice(addr.as_bytes());
    topic
}

/// 32-byte topic from an indexed string field: keccak256 of the UTF-8
/// bytes.
pub fn string_topic(value: &str) -> Hash {
    keccak256(value.as_bytes())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_topic_left_pads() {
        let addr = Address::new([0xAB; 20]);
        let topic = address_topic(addr);
        assert_eq!(&topic[..12], &[0u8; 12]);
        assert_eq!(&topic[12..], addr.as_bytes());
    }

    #[test]
    fn test_string_topic_is_keccak_not_hex() {
        // A name that happens to look hex-ish must still be hashed.
        let topic = string_topic("deadbeef");
        assert_eq!(topic, keccak256(b"deadbeef"));
        let mut hexish = [0u8; 32];
        hexish[28..].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_ne!(topic, hexish);
    }

    #[test]
    fn test_bucket_name_topic() {
        assert_eq!(string_topic("my-bucket"), keccak256(b"my-bucket"));
    }
}
