//! # Storage Ports
//!
//! `ObjectNftApi` is the outbound seam to the EVM: the ERC-721 twin of a
//! sealed object. The adapter must run the call inside the caller's
//! cache context so a burn failure rolls the delete back atomically.

use shared_store::Context;
use shared_types::{Address, ObjectId};

/// Errors crossing back from the EVM adapter.
pub type NftError = String;

/// Mint/burn seam for the non-transferable object NFT contract.
pub trait ObjectNftApi: Send + Sync {
    /// Mint the twin for a freshly sealed, non-empty object.
    fn mint(&self, ctx: &mut Context<'_>, object_id: ObjectId, owner: Address)
        -> Result<(), NftError>;

    /// Burn the twin. Invoked with `commit = true`; failure is fatal to
    /// the enclosing delete.
    fn burn(&self, ctx: &mut Context<'_>, object_id: ObjectId) -> Result<(), NftError>;

    /// True if a twin exists for the object.
    fn exists(&self, ctx: &Context<'_>, object_id: ObjectId) -> bool;
}
