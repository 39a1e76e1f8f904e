//! # mc-06-evm-precompiles
//!
//! EVM precompile adapter layer for Moca-Chain.
//!
//! ## Role in System
//!
//! Contracts at fixed addresses translate EVM calldata into native
//! module messages. Each precompile implements:
//!
//! - `required_gas(input)`: base gas plus an arity surcharge computed
//!   from the decoded calldata (capped per method)
//! - `run`: executes inside a child cache context; an error reverts the
//!   EVM snapshot and the store writes together, a success commits both
//!   and appends the logs
//!
//! ## Event Topics
//!
//! Address-indexed fields left-pad the 20 raw bytes into a 32-byte
//! topic. String-indexed fields (bucket/object/group names) hash with
//! keccak256 over the UTF-8 bytes. A string is never hex-parsed into a
//! topic.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod addresses;
pub mod errors;
pub mod gas;
pub mod nft;
pub mod precompile;
pub mod topics;

pub use errors::PrecompileError;
pub use nft::ObjectNftAdapter;
pub use precompile::{execute_precompile, EvmLog, Precompile, PrecompileOutput, PrecompileSet};
pub use topics::{address_topic, string_topic};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
