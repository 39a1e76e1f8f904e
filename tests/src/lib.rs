//! # Moca-Chain Test Suite
//!
//! Unified test crate driving the fully wired node through
//! `App::run_block`: every scenario commits real blocks, so the module
//! ordering, cache-context rollback and post-block reconciliation are
//! exercised alongside the feature under test.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Wired app + SP/GVG/bucket helpers
//! └── integration/      # End-to-end block scenarios
//!     ├── buckets.rs    # Caps, approvals, deletion
//!     ├── objects.rs    # Seal/NFT-twin lifecycle, refunds
//!     ├── bridge.rs     # Cross-chain V1/V2 routing
//!     └── registry.rs   # SP edits, slash records, settlement
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mc-tests
//! cargo test -p mc-tests integration::objects::
//! ```

pub mod fixtures;

#[cfg(test)]
mod integration;
