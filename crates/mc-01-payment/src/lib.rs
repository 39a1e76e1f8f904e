//! # mc-01-payment
//!
//! Stream-rate payment engine for Moca-Chain.
//!
//! ## Role in System
//!
//! Storage and virtual-group fees are not paid per block; they accrue as
//! continuous signed flow rates between payer stream records and
//! recipient virtual payment accounts. This crate owns:
//!
//! - **Stream records**: per-account netflow rate, static/buffer/lock
//!   balances, settle timestamps
//! - **OutFlows**: at most one active flow per `(from, to)` pair
//! - **Frozen lifecycle**: exhausted payers freeze; deposits resume them
//!   in deterministic order
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | `-netflow_rate = Σ active outflow rates` | `domain/invariants.rs`, checked by the periodic payment check |
//! | `static + buffer ≥ 0` while ACTIVE | settlement in `service.rs` |
//! | Global Σ netflow_rate = 0 | every change list is internally balanced |
//! | Frozen mutations require `force_update` | `service.rs` guard |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod events;
pub mod keys;
pub mod ports;
pub mod service;

pub use domain::entities::{OutFlow, PaymentAccount, PaymentParams, StreamRecord};
pub use domain::errors::PaymentError;
pub use domain::flows::{merge_outflows, merge_stream_record_changes, merge_user_flows};
pub use domain::value_objects::{
    OutFlowDelta, OutFlowStatus, StreamRecordChange, StreamStatus, UserFlows,
};
pub use ports::PaymentApi;
pub use service::PaymentService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
