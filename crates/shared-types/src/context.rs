//! # Block Context
//!
//! The height/time pair every handler sees. Consensus fixes both before
//! the first message of a block runs, so all reads within a block agree.

use serde::{Deserialize, Serialize};

/// Immutable per-block execution context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockContext {
    /// Block height.
    pub height: u64,
    /// Block time as unix seconds.
    pub time: i64,
}

impl BlockContext {
    /// Construct a block context.
    pub fn new(height: u64, time: i64) -> Self {
        Self { height, time }
    }
}
