//! # Object NFT Adapter
//!
//! The ERC-721 twin of a sealed object lives at a fixed,
//! non-transferable contract address. The storage engine calls mint on
//! seal and burn on sealed-delete; both run inside the caller's cache
//! context so a burn failure unwinds the delete with it. Burns always
//! commit (`commit = true`): there is no fire-and-forget path.

use crate::addresses::OBJECT_NFT;
use crate::topics::address_topic;
use mc_04_storage::ports::{NftError, ObjectNftApi};
use shared_crypto::keccak256;
use shared_store::kv::namespaces;
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{Address, ObjectId};

const TWIN: u8 = 0x01;

/// `burn(uint256)` selector.
pub fn burn_selector() -> [u8; 4] {
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&keccak256(b"burn(uint256)")[..4]);
    selector
}

/// `mint(address,uint256)` selector.
pub fn mint_selector() -> [u8; 4] {
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&keccak256(b"mint(address,uint256)")[..4]);
    selector
}

fn twin_key(object_id: ObjectId) -> Vec<u8> {
    let mut key = vec![namespaces::EVM, TWIN];
    let mut id = [0u8; 32];
    object_id.to_big_endian(&mut id);
    key.extend_from_slice(&id);
    key
}

/// The native implementation of the object twin contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectNftAdapter;

impl ObjectNftAdapter {
    /// Invoke the twin contract. `commit` is mandatory for burns; a
    /// non-committing burn would let the delete and the token diverge.
    fn call(
        &self,
        ctx: &mut Context<'_>,
        selector: [u8; 4],
        object_id: ObjectId,
        owner: Option<Address>,
        commit: bool,
    ) -> Result<(), NftError> {
        if !commit {
            return Err("object nft calls must commit".to_string());
        }
        let key = twin_key(object_id);
        if selector == mint_selector() {
            if ctx.store.has(&key) {
                return Err(format!("twin for object {object_id} already minted"));
            }
            let owner = owner.ok_or_else(|| "mint requires an owner".to_string())?;
            ctx.store.set(key, owner.as_bytes().to_vec());
            ctx.events.emit(shared_store::Event::new(
                "evm_log",
                vec![
                    ("address".to_string(), OBJECT_NFT.to_string()),
                    ("topic0".to_string(), hex_topic(&keccak256(b"Minted(address,uint256)"))),
                    ("topic1".to_string(), hex_topic(&address_topic(owner))),
                    ("token_id".to_string(), object_id.to_string()),
                ],
            ));
            Ok(())
        } else if selector == burn_selector() {
            if !ctx.store.has(&key) {
                return Err(format!("no twin for object {object_id}"));
            }
            ctx.store.delete(&key);
            ctx.events.emit(shared_store::Event::new(
                "evm_log",
                vec![
                    ("address".to_string(), OBJECT_NFT.to_string()),
                    ("topic0".to_string(), hex_topic(&keccak256(b"Burned(uint256)"))),
                    ("token_id".to_string(), object_id.to_string()),
                ],
            ));
            Ok(())
        } else {
            Err("unknown object nft selector".to_string())
        }
    }

    /// Twin owner, if minted.
    pub fn owner_of(store: &dyn KvRead, object_id: ObjectId) -> Option<Address> {
        store.get(&twin_key(object_id)).and_then(|bytes| Address::from_slice(&bytes))
    }
}

fn hex_topic(topic: &[u8; 32]) -> String {
    topic.iter().map(|b| format!("{b:02x}")).collect()
}

impl ObjectNftApi for ObjectNftAdapter {
    fn mint(
        &self,
        ctx: &mut Context<'_>,
        object_id: ObjectId,
        owner: Address,
    ) -> Result<(), NftError> {
        self.call(ctx, mint_selector(), object_id, Some(owner), true)
    }

    fn burn(&self, ctx: &mut Context<'_>, object_id: ObjectId) -> Result<(), NftError> {
        self.call(ctx, burn_selector(), object_id, None, true)
    }

    fn exists(&self, ctx: &Context<'_>, object_id: ObjectId) -> bool {
        ctx.store.has(&twin_key(object_id))
    }
}

// =============================================================================
// TESTS
// =============================================================================
