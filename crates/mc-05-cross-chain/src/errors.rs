//! # Bridge Errors
//!
//! Handler errors flow into a fail ack; protocol violations (unknown
//! op, wrong-version payload, malformed bytes) panic instead, because a
//! node that guesses at them diverges.

use thiserror::Error;

/// Bridge failures that produce a fail ack.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The underlying keeper rejected the operation.
    #[error("handler: {reason}")]
    Handler {
        /// Keeper-side reason.
        reason: String,
        /// Original extra data to echo in the fail ack.
        extra_data: Vec<u8>,
    },

    /// Referenced entity does not exist.
    #[error("entity not found")]
    EntityNotFound,
}

impl BridgeError {
    /// Extra data to carry into the fail ack.
    pub fn extra_data(&self) -> Vec<u8> {
        match self {
            BridgeError::Handler { extra_data, .. } => extra_data.clone(),
            BridgeError::EntityNotFound => Vec::new(),
        }
    }
}
