//! # Precompile Errors
//!
//! Errors become ABI-packed revert data: the standard `Error(string)`
//! selector followed by the encoded reason.

use shared_crypto::keccak256;
use thiserror::Error;

/// Precompile failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrecompileError {
    /// Calldata too short or undecodable.
    #[error("invalid calldata: {0}")]
    InvalidInput(String),

    /// Selector not implemented by this precompile.
    #[error("unknown method selector")]
    UnknownSelector,

    /// Native handler rejected the message.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// Gas limit exceeded before or during execution.
    #[error("out of gas")]
    OutOfGas,
}

impl PrecompileError {
    /// ABI-packed `Error(string)` revert payload.
    pub fn revert_data(&self) -> Vec<u8> {
        let selector = &keccak256(b"Error(string)")[..4];
        let reason = ethabi::encode(&[ethabi::Token::String(self.to_string())]);
        let mut out = Vec::with_capacity(4 + reason.len());
        out.extend_from_slice(selector);
        out.extend_from_slice(&reason);
        out
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_selector() {
        let data = PrecompileError::Reverted("nope".to_string()).revert_data();
        // Error(string) selector
        assert_eq!(&data[..4], &[0x08, 0xC3, 0x79, 0xA0]);
    }
}
