//! # SP Registry Service
//!
//! Registration is governance-gated and keeps six uniqueness indexes
//! (five addresses plus the BLS key). Edits release the old index entry
//! of every changed field so a later SP can claim the freed value.

use crate::domain::entities::{
    Description, GlobalSpStorePrice, SpParams, SpPrice, StorageProvider,
};
use crate::domain::errors::SpError;
use crate::domain::value_objects::{AddressField, SpStatus};
use crate::events;
use crate::keys;
use crate::ports::SpApi;
use shared_crypto::{verify_possession_proof, BlsPublicKey, BlsSignature};
use shared_store::bank::BankApi;
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{module_address, Address, Coin, ObjectId, SpId, Uint};
use std::sync::Arc;
use tracing::info;

/// Escrow account holding SP deposits.
pub fn sp_module_address() -> Address {
    module_address("storage_provider")
}

/// Registration message (authority-gated).
#[derive(Clone, Debug)]
pub struct CreateStorageProviderMsg {
    /// Must equal the governance authority.
    pub creator: Address,
    /// Operator address.
    pub operator: Address,
    /// Funding address (pays the deposit).
    pub funding: Address,
    /// Seal address.
    pub seal: Address,
    /// Approval address.
    pub approval: Address,
    /// GC address.
    pub gc: Address,
    /// Maintenance address.
    pub maintenance: Address,
    /// BLS public key.
    pub bls_pubkey: BlsPublicKey,
    /// Possession proof: self-signature over `tmhash(pubkey)`.
    pub bls_proof: BlsSignature,
    /// Service endpoint.
    pub endpoint: String,
    /// Deposit amount in the configured denom.
    pub deposit: u128,
    /// Operator metadata.
    pub description: Description,
}

/// Edit message; `None` fields stay untouched.
#[derive(Clone, Debug, Default)]
pub struct EditStorageProviderMsg {
    /// Identifies the SP.
    pub operator: Address,
    /// New seal address.
    pub seal: Option<Address>,
    /// New approval address.
    pub approval: Option<Address>,
    /// New GC address.
    pub gc: Option<Address>,
    /// New maintenance address.
    pub maintenance: Option<Address>,
    /// New endpoint.
    pub endpoint: Option<String>,
    /// New BLS key with a fresh possession proof.
    pub bls: Option<(BlsPublicKey, BlsSignature)>,
    /// New metadata.
    pub description: Option<Description>,
}

/// The storage-provider registry.
pub struct SpService {
    bank: Arc<dyn BankApi>,
    authority: Address,
}

impl SpService {
    /// Build over a bank port with the governance authority address.
    pub fn new(bank: Arc<dyn BankApi>, authority: Address) -> Self {
        Self { bank, authority }
    }

    /// Current governance params.
    pub fn get_params(&self, store: &dyn KvRead) -> SpParams {
        get_obj(store, &keys::params_key()).unwrap_or_default()
    }

    /// Overwrite governance params.
    pub fn set_params(&self, store: &mut dyn KvWrite, params: &SpParams) {
        put_obj(store, keys::params_key(), params);
    }

    /// SP by id.
    pub fn get_sp(&self, store: &dyn KvRead, id: SpId) -> Option<StorageProvider> {
        get_obj(store, &keys::sp_key(id))
    }

    /// SP by operator address.
    pub fn get_sp_by_operator(&self, store: &dyn KvRead, addr: Address) -> Option<StorageProvider> {
        let id: SpId = get_obj(store, &keys::operator_index_key(addr))?;
        self.get_sp(store, id)
    }

    fn save_sp(&self, store: &mut dyn KvWrite, sp: &StorageProvider) {
        put_obj(store, keys::sp_key(sp.id), sp);
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Register a storage provider.
    pub fn create_storage_provider(
        &self,
        ctx: &mut Context<'_>,
        msg: CreateStorageProviderMsg,
    ) -> Result<SpId, SpError> {
        if msg.creator != self.authority {
            return Err(SpError::Unauthorized { expected: self.authority });
        }
        validate_endpoint(&msg.endpoint)?;
        verify_possession_proof(&msg.bls_pubkey, &msg.bls_proof)
            .map_err(|_| SpError::InvalidBlsProof)?;

        let params = self.get_params(&ctx.store);
        if msg.deposit < params.min_deposit {
            return Err(SpError::DepositTooLow { got: msg.deposit, min: params.min_deposit });
        }

        for (field, addr) in [
            (AddressField::Operator, msg.operator),
            (AddressField::Funding, msg.funding),
            (AddressField::Seal, msg.seal),
            (AddressField::Approval, msg.approval),
            (AddressField::Gc, msg.gc),
        ] {
            if ctx.store.has(&index_key(field, addr)) {
                return Err(SpError::DuplicateAddress { field: field.name(), addr });
            }
        }
        if ctx.store.has(&keys::bls_index_key(&msg.bls_pubkey.bytes)) {
            return Err(SpError::DuplicateBlsKey);
        }

        let coin = Coin::new(params.deposit_denom.clone(), Uint::from(msg.deposit));
        self.bank
            .transfer(&mut ctx.store, msg.funding, sp_module_address(), &coin)
            .map_err(|_| SpError::InsufficientFunding)?;

        let id = self.next_sp_id(&mut ctx.store);
        let sp = StorageProvider {
            id,
            operator: msg.operator,
            funding: msg.funding,
            seal: msg.seal,
            approval: msg.approval,
            gc: msg.gc,
            maintenance: msg.maintenance,
            bls_pubkey: msg.bls_pubkey,
            deposit: msg.deposit,
            status: SpStatus::InService,
            endpoint: msg.endpoint,
            description: msg.description,
        };
        self.save_sp(&mut ctx.store, &sp);
        for (field, addr) in [
            (AddressField::Operator, sp.operator),
            (AddressField::Funding, sp.funding),
            (AddressField::Seal, sp.seal),
            (AddressField::Approval, sp.approval),
            (AddressField::Gc, sp.gc),
        ] {
            put_obj(&mut ctx.store, index_key(field, addr), &id);
        }
        put_obj(&mut ctx.store, keys::bls_index_key(&sp.bls_pubkey.bytes), &id);

        info!(sp_id = id, operator = %sp.operator, "storage provider registered");
        ctx.events.emit(events::create_storage_provider(&sp));
        Ok(id)
    }

    fn next_sp_id(&self, store: &mut dyn KvWrite) -> SpId {
        let next: SpId = get_obj(store, &keys::sequence_key()).unwrap_or(1);
        put_obj(store, keys::sequence_key(), &(next + 1));
        next
    }

    // =========================================================================
    // EDIT
    // =========================================================================

    /// Edit indexed and plain fields. Every supplied field must be either
    /// unchanged (idempotent) or uniquely new; changed indexed fields
    /// release their old index entries. A message that changes nothing
    /// fails.
    pub fn edit_storage_provider(
        &self,
        ctx: &mut Context<'_>,
        msg: EditStorageProviderMsg,
    ) -> Result<(), SpError> {
        let mut sp = self
            .get_sp_by_operator(&ctx.store, msg.operator)
            .ok_or(SpError::NotFound)?;
        let mut changed = false;

        fn reindex(
            ctx: &mut Context<'_>,
            field: AddressField,
            old: Address,
            new: Address,
            sp_id: SpId,
        ) -> Result<bool, SpError> {
            if new == old {
                return Ok(false);
            }
            if ctx.store.has(&index_key(field, new)) {
                return Err(SpError::DuplicateAddress { field: field.name(), addr: new });
            }
            ctx.store.delete(&index_key(field, old));
            put_obj(&mut ctx.store, index_key(field, new), &sp_id);
            Ok(true)
        }

        if let Some(new) = msg.seal {
            if reindex(ctx, AddressField::Seal, sp.seal, new, sp.id)? {
                sp.seal = new;
                changed = true;
            }
        }
        if let Some(new) = msg.approval {
            if reindex(ctx, AddressField::Approval, sp.approval, new, sp.id)? {
                sp.approval = new;
                changed = true;
            }
        }
        if let Some(new) = msg.gc {
            if reindex(ctx, AddressField::Gc, sp.gc, new, sp.id)? {
                sp.gc = new;
                changed = true;
            }
        }
        if let Some(new) = msg.maintenance {
            if new != sp.maintenance {
                sp.maintenance = new;
                changed = true;
            }
        }
        if let Some(new) = msg.endpoint {
            if new != sp.endpoint {
                validate_endpoint(&new)?;
                sp.endpoint = new;
                changed = true;
            }
        }
        if let Some((pubkey, proof)) = msg.bls {
            if pubkey != sp.bls_pubkey {
                verify_possession_proof(&pubkey, &proof).map_err(|_| SpError::InvalidBlsProof)?;
                if ctx.store.has(&keys::bls_index_key(&pubkey.bytes)) {
                    return Err(SpError::DuplicateBlsKey);
                }
                ctx.store.delete(&keys::bls_index_key(&sp.bls_pubkey.bytes));
                put_obj(&mut ctx.store, keys::bls_index_key(&pubkey.bytes), &sp.id);
                sp.bls_pubkey = pubkey;
                changed = true;
            }
        }
        if let Some(description) = msg.description {
            if description != sp.description {
                sp.description = description;
                changed = true;
            }
        }

        if !changed {
            return Err(SpError::StorageProviderNotChanged);
        }
        self.save_sp(&mut ctx.store, &sp);
        ctx.events.emit(events::edit_storage_provider(&sp));
        Ok(())
    }

    // =========================================================================
    // DEPOSIT / EXIT
    // =========================================================================

    /// Top up an SP's escrowed deposit from its funding account.
    pub fn deposit(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        amount: u128,
    ) -> Result<(), SpError> {
        let mut sp = self
            .get_sp_by_operator(&ctx.store, operator)
            .ok_or(SpError::NotFound)?;
        let params = self.get_params(&ctx.store);
        let coin = Coin::new(params.deposit_denom, Uint::from(amount));
        self.bank
            .transfer(&mut ctx.store, sp.funding, sp_module_address(), &coin)
            .map_err(|_| SpError::InsufficientFunding)?;
        sp.deposit += amount;
        self.save_sp(&mut ctx.store, &sp);
        ctx.events.emit(events::sp_deposit(sp.id, amount));
        Ok(())
    }

    // =========================================================================
    // PRICES
    // =========================================================================

    /// Set an SP's prices and refresh the global snapshot.
    pub fn update_sp_price(&self, ctx: &mut Context<'_>, price: SpPrice) -> Result<(), SpError> {
        if self.get_sp(&ctx.store, price.sp_id).is_none() {
            return Err(SpError::NotFound);
        }
        put_obj(&mut ctx.store, keys::sp_price_key(price.sp_id), &price);
        self.refresh_global_price(ctx);
        Ok(())
    }

    /// Recompute the network price as the mean over all SP prices.
    fn refresh_global_price(&self, ctx: &mut Context<'_>) {
        let entries = ctx.store.scan_prefix(&keys::sp_price_prefix());
        if entries.is_empty() {
            return;
        }
        let mut store_sum: u128 = 0;
        let mut read_sum: u128 = 0;
        for (_, bytes) in &entries {
            let price: SpPrice = bincode::deserialize(bytes)
                .unwrap_or_else(|e| panic!("corrupt sp price: {e}"));
            store_sum += price.store_price;
            read_sum += price.read_price;
        }
        let count = entries.len() as u128;
        let params = self.get_params(&ctx.store);
        let primary = store_sum / count;
        let secondary = primary * params.secondary_price_ratio_percent / 100;
        let snapshot = GlobalSpStorePrice {
            update_time: ctx.block.time,
            primary_store_price: primary,
            secondary_store_price: secondary,
            read_price: read_sum / count,
        };
        put_obj(&mut ctx.store, keys::global_price_key(snapshot.update_time), &snapshot);
        ctx.events.emit(events::global_price_updated(snapshot.update_time, primary, secondary));
    }

    /// Snapshot effective at `time`: greatest update_time ≤ `time`.
    pub fn get_global_price_at(
        &self,
        store: &dyn KvRead,
        time: i64,
    ) -> Option<GlobalSpStorePrice> {
        let mut selected = None;
        for (_, bytes) in store.scan_prefix(&keys::global_price_prefix()) {
            let snapshot: GlobalSpStorePrice = bincode::deserialize(&bytes)
                .unwrap_or_else(|e| panic!("corrupt global price: {e}"));
            if snapshot.update_time <= time {
                selected = Some(snapshot);
            } else {
                break;
            }
        }
        selected
    }

    // =========================================================================
    // SLASH RECORDS
    // =========================================================================

    /// Record a slash against `(sp, object)` at `height`.
    pub fn save_slash(
        &self,
        store: &mut dyn KvWrite,
        sp_id: SpId,
        object_id: ObjectId,
        height: u64,
    ) {
        store.set(keys::slash_key(sp_id, object_id, height), Vec::new());
    }

    /// True if any slash exists for `(sp, object)`.
    pub fn has_slash(&self, store: &dyn KvRead, sp_id: SpId, object_id: ObjectId) -> bool {
        !store.scan_prefix(&keys::slash_object_prefix(sp_id, object_id)).is_empty()
    }

    /// Remove every slash recorded at or below `height`, leaving later
    /// records for the same object (and every other SP) untouched.
    pub fn remove_slash_until(&self, store: &mut dyn KvWrite, height: u64) {
        let stale: Vec<Vec<u8>> = store
            .scan_prefix(&keys::slash_prefix())
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| keys::slash_key_height(key) <= height)
            .collect();
        for key in stale {
            store.delete(&key);
        }
    }
}

impl SpApi for SpService {
    fn sp_by_id(&self, store: &dyn KvRead, id: SpId) -> Option<StorageProvider> {
        self.get_sp(store, id)
    }

    fn sp_by_operator(&self, store: &dyn KvRead, addr: Address) -> Option<StorageProvider> {
        self.get_sp_by_operator(store, addr)
    }

    fn global_price_at(&self, store: &dyn KvRead, time: i64) -> Option<GlobalSpStorePrice> {
        self.get_global_price_at(store, time)
    }

    fn params(&self, store: &dyn KvRead) -> SpParams {
        self.get_params(store)
    }

    fn begin_exit(&self, ctx: &mut Context<'_>, sp_id: SpId) -> Result<(), SpError> {
        let mut sp = self.get_sp(&ctx.store, sp_id).ok_or(SpError::NotFound)?;
        if !sp.status.is_in_service() {
            return Err(SpError::InvalidStatus { sp_id });
        }
        sp.status = SpStatus::GracefulExiting;
        self.save_sp(&mut ctx.store, &sp);
        ctx.events.emit(events::sp_exit_requested(sp_id));
        Ok(())
    }

    fn complete_exit(&self, ctx: &mut Context<'_>, sp_id: SpId) -> Result<(), SpError> {
        let sp = self.get_sp(&ctx.store, sp_id).ok_or(SpError::NotFound)?;
        if !sp.status.is_exiting() {
            return Err(SpError::InvalidStatus { sp_id });
        }
        let params = self.get_params(&ctx.store);
        let refund = Coin::new(params.deposit_denom, Uint::from(sp.deposit));
        self.bank
            .transfer(&mut ctx.store, sp_module_address(), sp.funding, &refund)
            .unwrap_or_else(|e| panic!("sp escrow underfunded: {e}"));

        for (field, addr) in [
            (AddressField::Operator, sp.operator),
            (AddressField::Funding, sp.funding),
            (AddressField::Seal, sp.seal),
            (AddressField::Approval, sp.approval),
            (AddressField::Gc, sp.gc),
        ] {
            ctx.store.delete(&index_key(field, addr));
        }
        ctx.store.delete(&keys::bls_index_key(&sp.bls_pubkey.bytes));
        ctx.store.delete(&keys::sp_price_key(sp_id));
        ctx.store.delete(&keys::sp_key(sp_id));
        ctx.events.emit(events::sp_exit_completed(sp_id, sp.deposit));
        Ok(())
    }
}

fn index_key(field: AddressField, addr: Address) -> Vec<u8> {
    match field {
        AddressField::Operator => keys::operator_index_key(addr),
        AddressField::Funding => keys::funding_index_key(addr),
        AddressField::Seal => keys::seal_index_key(addr),
        AddressField::Approval => keys::approval_index_key(addr),
        AddressField::Gc => keys::gc_index_key(addr),
    }
}

/// Endpoints must be http(s) with a non-empty host.
fn validate_endpoint(endpoint: &str) -> Result<(), SpError> {
    let rest = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(SpError::InvalidEndpoint { endpoint: endpoint.to_string() }),
    }
}

// =============================================================================
// TESTS
// =============================================================================
