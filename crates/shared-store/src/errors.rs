//! # Store Errors

use thiserror::Error;

/// Errors surfaced by the store layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Gas meter exhausted; the current message must abort.
    #[error("out of gas: consumed {consumed}, limit {limit}")]
    OutOfGas {
        /// Gas consumed so far (including the failing charge).
        consumed: u64,
        /// Gas limit of the message.
        limit: u64,
    },

    /// Backend failure (RocksDB I/O).
    #[error("storage backend: {0}")]
    Backend(String),
}
