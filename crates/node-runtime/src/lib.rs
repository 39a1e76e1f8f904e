//! # node-runtime
//!
//! Assembles the Moca-Chain subsystems into a runnable node: the
//! validated [`config::AppConfig`], the [`container::App`] holding the
//! wired services and stores, and the genesis builder.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod container;
pub mod genesis;

pub use config::{AppConfig, CrossChainConfig};
pub use container::App;
pub use genesis::GenesisBuilder;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
