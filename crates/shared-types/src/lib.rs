//! # shared-types
//!
//! Domain primitives shared across Moca-Chain subsystems.
//!
//! ## Contents
//!
//! | Module | Types |
//! |--------|-------|
//! | `address` | `Address` (20-byte account), module-account derivation |
//! | `ids` | `SpId`, `GvgId`, `FamilyId`, `LvgId`, u256 entity ids |
//! | `coin` | `Coin`, `Denom`, signed `FlowRate` |
//! | `context` | `BlockContext` (height + unix time) |
//! | `common` | `SourceType`, `Visibility` |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod coin;
pub mod common;
pub mod context;
pub mod ids;

pub use address::{derive_address, module_address, Address};
pub use coin::{Coin, Denom, FlowRate};
pub use common::{SourceType, Visibility};
pub use context::BlockContext;
pub use ids::{BucketId, FamilyId, GroupId, GvgId, LvgId, ObjectId, PolicyId, SpId, Uint};

/// 32-byte hash output.
pub type Hash = [u8; 32];

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
