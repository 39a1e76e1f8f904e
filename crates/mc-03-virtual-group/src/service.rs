//! # Virtual-Group Service
//!
//! Group and family lifecycle. Swap-out is predecessor-initiated and
//! carries a successor approval signature; swap-in is successor-initiated
//! through a time-bounded reservation. An SP exit completes only when no
//! group or family references the SP anymore.

use crate::domain::entities::{GlobalVirtualGroup, GvgFamily, SwapInInfo, SwapOutInfo, VgParams};
use crate::domain::errors::VgError;
use crate::events;
use crate::keys;
use crate::ports::{StorageStatsApi, VirtualGroupApi};
use mc_01_payment::PaymentApi;
use mc_02_sp_registry::{SpApi, StorageProvider};
use parking_lot::RwLock;
use shared_crypto::{keccak256, verify_signer, EcdsaSignature};
use shared_store::bank::BankApi;
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{
    derive_address, Address, Coin, FamilyId, GvgId, SpId, Uint, NO_SPECIFIED_FAMILY_ID,
};
use std::sync::Arc;
use tracing::info;

/// A successor's signed consent to take over groups.
#[derive(Clone, Debug)]
pub struct SuccessorApproval {
    /// Block height the approval expires at.
    pub expired_height: u64,
    /// Signature by the successor's approval address.
    pub sig: EcdsaSignature,
}

/// Digest the successor signs: binds predecessor, family and expiry.
pub fn swap_approval_digest(sp_id: SpId, family_id: FamilyId, expired_height: u64) -> [u8; 32] {
    let mut message = Vec::with_capacity(16 + 4 + 4 + 8);
    message.extend_from_slice(b"swap-out-approval");
    message.extend_from_slice(&sp_id.to_be_bytes());
    message.extend_from_slice(&family_id.to_be_bytes());
    message.extend_from_slice(&expired_height.to_be_bytes());
    keccak256(&message)
}

/// The virtual-group engine.
pub struct VirtualGroupService {
    bank: Arc<dyn BankApi>,
    payment: Arc<dyn PaymentApi>,
    sp: Arc<dyn SpApi>,
    storage: RwLock<Option<Arc<dyn StorageStatsApi>>>,
}

impl VirtualGroupService {
    /// Build without a storage handle; call [`Self::set_storage_api`]
    /// before processing blocks.
    pub fn new(bank: Arc<dyn BankApi>, payment: Arc<dyn PaymentApi>, sp: Arc<dyn SpApi>) -> Self {
        Self { bank, payment, sp, storage: RwLock::new(None) }
    }

    /// Late-bind the storage handle (constructor-then-setter).
    pub fn set_storage_api(&self, api: Arc<dyn StorageStatsApi>) {
        *self.storage.write() = Some(api);
    }

    fn storage_api(&self) -> Arc<dyn StorageStatsApi> {
        self.storage
            .read()
            .clone()
            .unwrap_or_else(|| panic!("virtual-group storage handle not wired"))
    }

    /// Current governance params.
    pub fn get_params(&self, store: &dyn KvRead) -> VgParams {
        get_obj(store, &keys::params_key()).unwrap_or_default()
    }

    /// Overwrite governance params.
    pub fn set_params(&self, store: &mut dyn KvWrite, params: &VgParams) {
        put_obj(store, keys::params_key(), params);
    }

    /// Group by id.
    pub fn get_gvg(&self, store: &dyn KvRead, id: GvgId) -> Option<GlobalVirtualGroup> {
        get_obj(store, &keys::gvg_key(id))
    }

    /// Family by id.
    pub fn get_family(&self, store: &dyn KvRead, id: FamilyId) -> Option<GvgFamily> {
        get_obj(store, &keys::family_key(id))
    }

    fn save_gvg(&self, store: &mut dyn KvWrite, gvg: &GlobalVirtualGroup) {
        put_obj(store, keys::gvg_key(gvg.id), gvg);
    }

    fn save_family(&self, store: &mut dyn KvWrite, family: &GvgFamily) {
        put_obj(store, keys::family_key(family.id), family);
    }

    fn in_service_sp(&self, store: &dyn KvRead, operator: Address) -> Result<StorageProvider, VgError> {
        let sp = self.sp.sp_by_operator(store, operator).ok_or(VgError::SpNotFound)?;
        if !sp.status.is_in_service() {
            return Err(VgError::SpNotInService { sp_id: sp.id });
        }
        Ok(sp)
    }

    // =========================================================================
    // CREATE / DELETE
    // =========================================================================

    /// Create a group under the caller's primary role. Family id 0
    /// creates a fresh family lazily.
    pub fn create_global_virtual_group(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        family_id: FamilyId,
        secondary_sp_ids: Vec<SpId>,
        deposit: u128,
        deposit_denom: &str,
    ) -> Result<GvgId, VgError> {
        let sp = self.in_service_sp(&ctx.store, operator)?;

        // Secondaries: distinct from the primary and from each other.
        let mut seen = std::collections::BTreeSet::new();
        for id in &secondary_sp_ids {
            if *id == sp.id || !seen.insert(*id) {
                return Err(VgError::InvalidSecondarySet);
            }
            if self.sp.sp_by_id(&ctx.store, *id).is_none() {
                return Err(VgError::SpNotFound);
            }
        }

        let sp_params = self.sp.params(&ctx.store);
        if deposit_denom != sp_params.deposit_denom {
            return Err(VgError::DepositDenomMismatch { got: deposit_denom.to_string() });
        }

        let params = self.get_params(&ctx.store);
        let mut family = if family_id == NO_SPECIFIED_FAMILY_ID {
            let id = self.next_id(&mut ctx.store, keys::family_sequence_key());
            let family = GvgFamily {
                id,
                primary_sp_id: sp.id,
                virtual_payment_address: derive_address(
                    "gvg-family",
                    &[&id.to_be_bytes()],
                ),
                gvg_ids: Vec::new(),
            };
            ctx.events.emit(events::create_family(&family));
            family
        } else {
            let family = self
                .get_family(&ctx.store, family_id)
                .ok_or(VgError::FamilyNotFound { family_id })?;
            if family.primary_sp_id != sp.id {
                return Err(VgError::FamilyPrimaryMismatch { family_id });
            }
            if family.gvg_ids.len() as u32 >= params.max_gvg_per_family {
                return Err(VgError::FamilyGvgLimit {
                    family_id,
                    current: family.gvg_ids.len() as u32,
                    limit: params.max_gvg_per_family,
                });
            }
            family
        };

        let id = self.next_id(&mut ctx.store, keys::gvg_sequence_key());
        let gvg = GlobalVirtualGroup {
            id,
            family_id: family.id,
            primary_sp_id: sp.id,
            secondary_sp_ids,
            stored_size: 0,
            virtual_payment_address: derive_address("global-virtual-group", &[&id.to_be_bytes()]),
            total_deposit: deposit,
        };
        let coin = Coin::new(sp_params.deposit_denom, Uint::from(deposit));
        self.bank
            .transfer(&mut ctx.store, sp.funding, gvg.virtual_payment_address, &coin)
            .map_err(|_| VgError::InsufficientFunding)?;

        family.gvg_ids.push(id);
        self.save_family(&mut ctx.store, &family);
        self.save_gvg(&mut ctx.store, &gvg);
        info!(gvg_id = id, family_id = family.id, "global virtual group created");
        ctx.events.emit(events::create_gvg(&gvg));
        Ok(id)
    }

    /// Delete an empty group and refund its deposit.
    pub fn delete_global_virtual_group(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        gvg_id: GvgId,
    ) -> Result<(), VgError> {
        let sp = self.sp.sp_by_operator(&ctx.store, operator).ok_or(VgError::SpNotFound)?;
        let gvg = self.get_gvg(&ctx.store, gvg_id).ok_or(VgError::GvgNotFound { gvg_id })?;
        if gvg.primary_sp_id != sp.id {
            return Err(VgError::NotPrimary { gvg_id });
        }
        if !gvg.is_empty() {
            return Err(VgError::GvgNotEmpty { gvg_id });
        }
        let sp_params = self.sp.params(&ctx.store);
        let refund = Coin::new(sp_params.deposit_denom, Uint::from(gvg.total_deposit));
        self.bank
            .transfer(&mut ctx.store, gvg.virtual_payment_address, sp.funding, &refund)
            .unwrap_or_else(|e| panic!("gvg deposit account underfunded: {e}"));

        if let Some(mut family) = self.get_family(&ctx.store, gvg.family_id) {
            family.gvg_ids.retain(|id| *id != gvg_id);
            self.save_family(&mut ctx.store, &family);
        }
        ctx.store.delete(&keys::gvg_key(gvg_id));
        ctx.events.emit(events::delete_gvg(gvg_id));
        Ok(())
    }

    fn next_id(&self, store: &mut dyn KvWrite, sequence_key: Vec<u8>) -> u32 {
        let next: u32 = get_obj(store, &sequence_key).unwrap_or(1);
        put_obj(store, sequence_key, &(next + 1));
        next
    }

    // =========================================================================
    // SWAP OUT (predecessor-initiated)
    // =========================================================================

    /// Reserve handover of up to 50 groups to an approving successor.
    pub fn swap_out(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        family_id: FamilyId,
        gvg_ids: &[GvgId],
        successor_sp_id: SpId,
        approval: &SuccessorApproval,
    ) -> Result<(), VgError> {
        if gvg_ids.is_empty() || gvg_ids.len() > 50 {
            return Err(VgError::InvalidGvgCount { got: gvg_ids.len() });
        }
        let sp = self.sp.sp_by_operator(&ctx.store, operator).ok_or(VgError::SpNotFound)?;
        let successor =
            self.sp.sp_by_id(&ctx.store, successor_sp_id).ok_or(VgError::SpNotFound)?;
        if !successor.status.is_in_service() || successor.id == sp.id {
            return Err(VgError::SpNotInService { sp_id: successor_sp_id });
        }
        if approval.expired_height <= ctx.block.height {
            return Err(VgError::ApprovalExpired);
        }
        let digest = swap_approval_digest(sp.id, family_id, approval.expired_height);
        verify_signer(&digest, &approval.sig, successor.approval)
            .map_err(|_| VgError::InvalidApproval)?;

        for gvg_id in gvg_ids {
            let gvg =
                self.get_gvg(&ctx.store, *gvg_id).ok_or(VgError::GvgNotFound { gvg_id: *gvg_id })?;
            if gvg.family_id != family_id {
                return Err(VgError::FamilyNotFound { family_id });
            }
            if gvg.primary_sp_id != sp.id {
                return Err(VgError::NotPrimary { gvg_id: *gvg_id });
            }
            let key = keys::swap_out_key(family_id, *gvg_id);
            if ctx.store.has(&key) {
                return Err(VgError::SwapInfoExists);
            }
            put_obj(
                &mut ctx.store,
                key,
                &SwapOutInfo { sp_id: sp.id, successor_sp_id },
            );
        }
        ctx.events.emit(events::swap_out(sp.id, successor_sp_id, family_id, gvg_ids.len()));
        Ok(())
    }

    /// Complete reserved handovers; the family's primary flips once every
    /// member group has moved.
    pub fn complete_swap_out(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        family_id: FamilyId,
        gvg_ids: &[GvgId],
    ) -> Result<(), VgError> {
        if gvg_ids.is_empty() || gvg_ids.len() > 50 {
            return Err(VgError::InvalidGvgCount { got: gvg_ids.len() });
        }
        let successor = self.in_service_sp(&ctx.store, operator)?;
        for gvg_id in gvg_ids {
            let key = keys::swap_out_key(family_id, *gvg_id);
            let info: SwapOutInfo = get_obj(&ctx.store, &key)
                .ok_or(VgError::SwapInfoNotFound { gvg_id: *gvg_id })?;
            if info.successor_sp_id != successor.id {
                return Err(VgError::SwapSuccessorMismatch);
            }
            let mut gvg =
                self.get_gvg(&ctx.store, *gvg_id).ok_or(VgError::GvgNotFound { gvg_id: *gvg_id })?;
            gvg.primary_sp_id = successor.id;
            self.save_gvg(&mut ctx.store, &gvg);
            ctx.store.delete(&key);
        }

        let mut family = self
            .get_family(&ctx.store, family_id)
            .ok_or(VgError::FamilyNotFound { family_id })?;
        let all_moved = family.gvg_ids.iter().all(|id| {
            self.get_gvg(&ctx.store, *id)
                .map(|gvg| gvg.primary_sp_id == successor.id)
                .unwrap_or(false)
        });
        if all_moved {
            family.primary_sp_id = successor.id;
            self.save_family(&mut ctx.store, &family);
        }
        ctx.events.emit(events::complete_swap_out(successor.id, family_id, gvg_ids.len()));
        Ok(())
    }

    // =========================================================================
    // SWAP IN (successor-initiated)
    // =========================================================================

    /// Reserve a takeover of `target_sp_id`'s role in a family (gvg 0) or
    /// one group. A live reservation blocks competitors until it expires.
    pub fn reserve_swap_in(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        target_sp_id: SpId,
        family_id: FamilyId,
        gvg_id: GvgId,
    ) -> Result<(), VgError> {
        let successor = self.in_service_sp(&ctx.store, operator)?;
        if successor.id == target_sp_id {
            return Err(VgError::InvalidSecondarySet);
        }
        if gvg_id == 0 {
            let family = self
                .get_family(&ctx.store, family_id)
                .ok_or(VgError::FamilyNotFound { family_id })?;
            if family.primary_sp_id != target_sp_id {
                return Err(VgError::FamilyPrimaryMismatch { family_id });
            }
        } else {
            let gvg = self.get_gvg(&ctx.store, gvg_id).ok_or(VgError::GvgNotFound { gvg_id })?;
            let involved = gvg.primary_sp_id == target_sp_id
                || gvg.secondary_sp_ids.contains(&target_sp_id);
            if !involved {
                return Err(VgError::NotPrimary { gvg_id });
            }
        }
        let key = keys::swap_in_key(family_id, gvg_id);
        if let Some(existing) = get_obj::<SwapInInfo>(&ctx.store, &key) {
            if existing.expiration_time > ctx.block.time {
                return Err(VgError::SwapInfoExists);
            }
        }
        let params = self.get_params(&ctx.store);
        put_obj(
            &mut ctx.store,
            key,
            &SwapInInfo {
                target_sp_id,
                successor_sp_id: successor.id,
                expiration_time: ctx.block.time + params.swap_in_validity_period as i64,
            },
        );
        ctx.events.emit(events::reserve_swap_in(successor.id, target_sp_id, family_id, gvg_id));
        Ok(())
    }

    /// Execute a live reservation: the successor takes the target's role.
    pub fn complete_swap_in(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        family_id: FamilyId,
        gvg_id: GvgId,
    ) -> Result<(), VgError> {
        let successor = self.in_service_sp(&ctx.store, operator)?;
        let key = keys::swap_in_key(family_id, gvg_id);
        let info: SwapInInfo =
            get_obj(&ctx.store, &key).ok_or(VgError::SwapInfoNotFound { gvg_id })?;
        if info.successor_sp_id != successor.id {
            return Err(VgError::SwapSuccessorMismatch);
        }
        if info.expiration_time <= ctx.block.time {
            return Err(VgError::ApprovalExpired);
        }

        if gvg_id == 0 {
            let mut family = self
                .get_family(&ctx.store, family_id)
                .ok_or(VgError::FamilyNotFound { family_id })?;
            family.primary_sp_id = successor.id;
            let member_ids = family.gvg_ids.clone();
            self.save_family(&mut ctx.store, &family);
            for id in member_ids {
                let mut gvg =
                    self.get_gvg(&ctx.store, id).ok_or(VgError::GvgNotFound { gvg_id: id })?;
                gvg.primary_sp_id = successor.id;
                self.save_gvg(&mut ctx.store, &gvg);
            }
        } else {
            let mut gvg = self.get_gvg(&ctx.store, gvg_id).ok_or(VgError::GvgNotFound { gvg_id })?;
            if gvg.primary_sp_id == info.target_sp_id {
                gvg.primary_sp_id = successor.id;
            } else {
                for slot in gvg.secondary_sp_ids.iter_mut() {
                    if *slot == info.target_sp_id {
                        *slot = successor.id;
                    }
                }
            }
            self.save_gvg(&mut ctx.store, &gvg);
        }
        ctx.store.delete(&key);
        ctx.events.emit(events::complete_swap_in(successor.id, family_id, gvg_id));
        Ok(())
    }

    /// Cancel the caller's own reservation.
    pub fn cancel_swap_in(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        family_id: FamilyId,
        gvg_id: GvgId,
    ) -> Result<(), VgError> {
        let successor = self.sp.sp_by_operator(&ctx.store, operator).ok_or(VgError::SpNotFound)?;
        let key = keys::swap_in_key(family_id, gvg_id);
        let info: SwapInInfo =
            get_obj(&ctx.store, &key).ok_or(VgError::SwapInfoNotFound { gvg_id })?;
        if info.successor_sp_id != successor.id {
            return Err(VgError::SwapSuccessorMismatch);
        }
        ctx.store.delete(&key);
        ctx.events.emit(events::cancel_swap_in(family_id, gvg_id));
        Ok(())
    }

    // =========================================================================
    // SP EXIT
    // =========================================================================

    /// Phase one: move the caller's SP into `GRACEFUL_EXITING`.
    pub fn sp_exit(&self, ctx: &mut Context<'_>, operator: Address) -> Result<(), VgError> {
        let sp = self.sp.sp_by_operator(&ctx.store, operator).ok_or(VgError::SpNotFound)?;
        self.sp.begin_exit(ctx, sp.id).map_err(|e| VgError::Registry(e.to_string()))
    }

    /// Phase two: every group and family must be rid of the SP, and no
    /// bucket may still sit on a family it owned.
    pub fn complete_sp_exit(&self, ctx: &mut Context<'_>, operator: Address) -> Result<(), VgError> {
        let sp = self.sp.sp_by_operator(&ctx.store, operator).ok_or(VgError::SpNotFound)?;

        for (_, bytes) in ctx.store.scan_prefix(&keys::gvg_prefix()) {
            let gvg: GlobalVirtualGroup =
                bincode::deserialize(&bytes).unwrap_or_else(|e| panic!("corrupt gvg: {e}"));
            if gvg.primary_sp_id == sp.id || gvg.secondary_sp_ids.contains(&sp.id) {
                return Err(VgError::SpNotDrained { sp_id: sp.id });
            }
        }

        let storage = self.storage_api();
        let mut owned_families = Vec::new();
        for (_, bytes) in ctx.store.scan_prefix(&keys::family_prefix()) {
            let family: GvgFamily =
                bincode::deserialize(&bytes).unwrap_or_else(|e| panic!("corrupt family: {e}"));
            if family.primary_sp_id == sp.id {
                if !family.gvg_ids.is_empty() || storage.family_in_use(&ctx.store, family.id) {
                    return Err(VgError::SpNotDrained { sp_id: sp.id });
                }
                owned_families.push(family.id);
            }
        }
        for family_id in owned_families {
            ctx.store.delete(&keys::family_key(family_id));
        }

        self.sp.complete_exit(ctx, sp.id).map_err(|e| VgError::Registry(e.to_string()))
    }

    // =========================================================================
    // DEPOSIT / SETTLEMENT
    // =========================================================================

    /// Top up a group's locked deposit.
    pub fn deposit(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        gvg_id: GvgId,
        amount: u128,
    ) -> Result<(), VgError> {
        let sp = self.sp.sp_by_operator(&ctx.store, operator).ok_or(VgError::SpNotFound)?;
        let mut gvg = self.get_gvg(&ctx.store, gvg_id).ok_or(VgError::GvgNotFound { gvg_id })?;
        if gvg.primary_sp_id != sp.id {
            return Err(VgError::NotPrimary { gvg_id });
        }
        let sp_params = self.sp.params(&ctx.store);
        let coin = Coin::new(sp_params.deposit_denom, Uint::from(amount));
        self.bank
            .transfer(&mut ctx.store, sp.funding, gvg.virtual_payment_address, &coin)
            .map_err(|_| VgError::InsufficientFunding)?;
        gvg.total_deposit += amount;
        self.save_gvg(&mut ctx.store, &gvg);
        Ok(())
    }

    /// Settle a family's virtual payment account into the primary SP's
    /// funding address.
    pub fn settle_family(&self, ctx: &mut Context<'_>, family_id: FamilyId) -> Result<u128, VgError> {
        let family = self
            .get_family(&ctx.store, family_id)
            .ok_or(VgError::FamilyNotFound { family_id })?;
        let primary = self
            .sp
            .sp_by_id(&ctx.store, family.primary_sp_id)
            .ok_or(VgError::SpNotFound)?;
        let amount = self
            .payment
            .settle_and_withdraw(ctx, family.virtual_payment_address, primary.funding)
            .unwrap_or(0);
        ctx.events.emit(events::settle_family(family_id, amount));
        Ok(amount)
    }

    /// Settle a group's virtual payment account and split it equally
    /// among the secondaries' funding addresses; the remainder stays on
    /// the group account.
    pub fn settle_gvg(&self, ctx: &mut Context<'_>, gvg_id: GvgId) -> Result<u128, VgError> {
        let gvg = self.get_gvg(&ctx.store, gvg_id).ok_or(VgError::GvgNotFound { gvg_id })?;
        let amount = self
            .payment
            .settle_and_withdraw(ctx, gvg.virtual_payment_address, gvg.virtual_payment_address)
            .unwrap_or(0);
        if amount > 0 && !gvg.secondary_sp_ids.is_empty() {
            let sp_params = self.sp.params(&ctx.store);
            let share = amount / gvg.secondary_sp_ids.len() as u128;
            if share > 0 {
                for sp_id in &gvg.secondary_sp_ids {
                    let secondary =
                        self.sp.sp_by_id(&ctx.store, *sp_id).ok_or(VgError::SpNotFound)?;
                    let coin = Coin::new(sp_params.deposit_denom.clone(), Uint::from(share));
                    self.bank
                        .transfer(
                            &mut ctx.store,
                            gvg.virtual_payment_address,
                            secondary.funding,
                            &coin,
                        )
                        .unwrap_or_else(|e| panic!("gvg settlement underfunded: {e}"));
                }
            }
        }
        ctx.events.emit(events::settle_gvg(gvg_id, amount));
        Ok(amount)
    }
}

impl VirtualGroupApi for VirtualGroupService {
    fn gvg(&self, store: &dyn KvRead, id: GvgId) -> Option<GlobalVirtualGroup> {
        self.get_gvg(store, id)
    }

    fn family(&self, store: &dyn KvRead, id: FamilyId) -> Option<GvgFamily> {
        self.get_family(store, id)
    }

    fn family_for_new_bucket(
        &self,
        store: &dyn KvRead,
        primary_sp_id: SpId,
        requested: FamilyId,
    ) -> Result<GvgFamily, VgError> {
        if requested != NO_SPECIFIED_FAMILY_ID {
            let family = self
                .get_family(store, requested)
                .ok_or(VgError::FamilyNotFound { family_id: requested })?;
            if family.primary_sp_id != primary_sp_id {
                return Err(VgError::FamilyPrimaryMismatch { family_id: requested });
            }
            return Ok(family);
        }
        for (_, bytes) in store.scan_prefix(&keys::family_prefix()) {
            let family: GvgFamily =
                bincode::deserialize(&bytes).unwrap_or_else(|e| panic!("corrupt family: {e}"));
            if family.primary_sp_id == primary_sp_id && !family.gvg_ids.is_empty() {
                return Ok(family);
            }
        }
        Err(VgError::NoAvailableFamily { sp_id: primary_sp_id })
    }

    fn pick_gvg_for_object(
        &self,
        store: &dyn KvRead,
        family_id: FamilyId,
    ) -> Result<GlobalVirtualGroup, VgError> {
        let family =
            self.get_family(store, family_id).ok_or(VgError::FamilyNotFound { family_id })?;
        let first = family
            .gvg_ids
            .first()
            .copied()
            .ok_or(VgError::NoAvailableFamily { sp_id: family.primary_sp_id })?;
        self.get_gvg(store, first).ok_or(VgError::GvgNotFound { gvg_id: first })
    }

    fn add_stored_size(
        &self,
        ctx: &mut Context<'_>,
        gvg_id: GvgId,
        delta: i64,
    ) -> Result<(), VgError> {
        let mut gvg = self.get_gvg(&ctx.store, gvg_id).ok_or(VgError::GvgNotFound { gvg_id })?;
        let next = gvg.stored_size as i64 + delta;
        gvg.stored_size = next.max(0) as u64;
        self.save_gvg(&mut ctx.store, &gvg);
        Ok(())
    }

    fn params(&self, store: &dyn KvRead) -> VgParams {
        self.get_params(store)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use blst::min_pk::SecretKey as BlsSecretKey;
    use k256::ecdsa::SigningKey;
    use mc_01_payment::PaymentService;
    use mc_02_sp_registry::service::CreateStorageProviderMsg;
    use mc_02_sp_registry::{Description, SpService};
    use shared_crypto::{tmhash, BlsPublicKey, BlsSignature, VOTEPOOL_DST};
    use shared_store::bank::BankStore;
    use shared_store::MemStore;
    use shared_types::BlockContext;

    struct Fixture {
        svc: VirtualGroupService,
        sp_svc: Arc<SpService>,
        store: MemStore,
        approval_keys: Vec<SigningKey>,
    }

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn eth_address(key: &SigningKey) -> Address {
        let point = key.verifying_key().to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut out = [0u8; 20];
        out.copy_from_slice(&hash[12..32]);
        Address::new(out)
    }

    struct NoBuckets;
    impl StorageStatsApi for NoBuckets {
        fn family_in_use(&self, _store: &dyn KvRead, _family_id: FamilyId) -> bool {
            false
        }
    }

    /// Registers `count` SPs (operator addr = 10·n, funding = 10·n+1) and
    /// returns a wired fixture.
    fn fixture(count: u8) -> Fixture {
        let bank = Arc::new(BankStore);
        let sp_svc = Arc::new(SpService::new(bank.clone(), addr(0xEE)));
        let payment = Arc::new(PaymentService::new(bank.clone()));
        let svc = VirtualGroupService::new(bank.clone(), payment, sp_svc.clone());
        svc.set_storage_api(Arc::new(NoBuckets));

        let mut store = MemStore::new();
        let mut approval_keys = Vec::new();
        for n in 1..=count {
            let base = n * 10;
            BankStore.mint(&mut store, addr(base + 1), &Coin::new("umoca", Uint::from(50_000_000u64)));
            let bls = BlsSecretKey::key_gen(&[n; 32], &[]).unwrap();
            let pk = BlsPublicKey { bytes: bls.sk_to_pk().to_bytes() };
            let proof =
                BlsSignature { bytes: bls.sign(&tmhash(&pk.bytes), VOTEPOOL_DST, &[]).to_bytes() };
            let approval_key = SigningKey::random(&mut rand::rngs::OsRng);
            let mut ctx = Context::new(&store, BlockContext::new(1, 100));
            sp_svc
                .create_storage_provider(
                    &mut ctx,
                    CreateStorageProviderMsg {
                        creator: addr(0xEE),
                        operator: addr(base),
                        funding: addr(base + 1),
                        seal: addr(base + 2),
                        approval: eth_address(&approval_key),
                        gc: addr(base + 4),
                        maintenance: addr(base + 5),
                        bls_pubkey: pk,
                        bls_proof: proof,
                        endpoint: "https://sp.example.com".to_string(),
                        deposit: 2_000_000,
                        description: Description::default(),
                    },
                )
                .unwrap();
            let writes = ctx.store.into_writes();
            shared_store::cache::apply_writes(&mut store, writes);
            approval_keys.push(approval_key);
        }
        Fixture { svc, sp_svc, store, approval_keys }
    }

    fn sign_approval(
        key: &SigningKey,
        sp_id: SpId,
        family_id: FamilyId,
        expired_height: u64,
    ) -> SuccessorApproval {
        let digest = swap_approval_digest(sp_id, family_id, expired_height);
        let (sig, recid) = key.sign_prehash_recoverable(&digest).unwrap();
        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        SuccessorApproval {
            expired_height,
            sig: EcdsaSignature { r, s, v: recid.to_byte() },
        }
    }

    #[test]
    fn test_create_gvg_creates_family_lazily() {
        let fx = fixture(3);
        let mut ctx = Context::new(&fx.store, BlockContext::new(2, 200));
        let gvg_id = fx
            .svc
            .create_global_virtual_group(&mut ctx, addr(10), 0, vec![2, 3], 1_000_000, "umoca")
            .unwrap();
        let gvg = fx.svc.get_gvg(&ctx.store, gvg_id).unwrap();
        assert_eq!(gvg.primary_sp_id, 1);
        let family = fx.svc.get_family(&ctx.store, gvg.family_id).unwrap();
        assert_eq!(family.primary_sp_id, 1);
        assert_eq!(family.gvg_ids, vec![gvg_id]);
        // Deposit locked on the virtual payment account
        assert_eq!(
            BankStore.balance_of(&ctx.store, gvg.virtual_payment_address, "umoca"),
            Uint::from(1_000_000u64)
        );
    }

    #[test]
    fn test_secondary_validation() {
        let fx = fixture(2);
        let mut ctx = Context::new(&fx.store, BlockContext::new(2, 200));
        // Secondary equals primary
        let err = fx
            .svc
            .create_global_virtual_group(&mut ctx, addr(10), 0, vec![1, 2], 1_000, "umoca")
            .unwrap_err();
        assert_eq!(err, VgError::InvalidSecondarySet);
        // Duplicate secondary
        let err = fx
            .svc
            .create_global_virtual_group(&mut ctx, addr(10), 0, vec![2, 2], 1_000, "umoca")
            .unwrap_err();
        assert_eq!(err, VgError::InvalidSecondarySet);
    }

    #[test]
    fn test_swap_out_lifecycle() {
        let fx = fixture(3);
        let mut ctx = Context::new(&fx.store, BlockContext::new(2, 200));
        let gvg_id = fx
            .svc
            .create_global_virtual_group(&mut ctx, addr(10), 0, vec![3], 1_000, "umoca")
            .unwrap();
        let family_id = fx.svc.get_gvg(&ctx.store, gvg_id).unwrap().family_id;

        // SP 2's approval key signs the takeover of SP 1's family
        let approval = sign_approval(&fx.approval_keys[1], 1, family_id, 100);
        fx.svc
            .swap_out(&mut ctx, addr(10), family_id, &[gvg_id], 2, &approval)
            .unwrap();

        // Expired approval is rejected for further reservations
        let stale = sign_approval(&fx.approval_keys[1], 1, family_id, 2);
        let err = fx
            .svc
            .swap_out(&mut ctx, addr(10), family_id, &[gvg_id], 2, &stale)
            .unwrap_err();
        assert_eq!(err, VgError::ApprovalExpired);

        // Only the approved successor may complete
        let err = fx
            .svc
            .complete_swap_out(&mut ctx, addr(30), family_id, &[gvg_id])
            .unwrap_err();
        assert_eq!(err, VgError::SwapSuccessorMismatch);

        fx.svc.complete_swap_out(&mut ctx, addr(20), family_id, &[gvg_id]).unwrap();
        assert_eq!(fx.svc.get_gvg(&ctx.store, gvg_id).unwrap().primary_sp_id, 2);
        assert_eq!(fx.svc.get_family(&ctx.store, family_id).unwrap().primary_sp_id, 2);
    }

    #[test]
    fn test_swap_out_count_bounds() {
        let fx = fixture(2);
        let mut ctx = Context::new(&fx.store, BlockContext::new(2, 200));
        let approval = sign_approval(&fx.approval_keys[1], 1, 1, 100);
        let err = fx.svc.swap_out(&mut ctx, addr(10), 1, &[], 2, &approval).unwrap_err();
        assert_eq!(err, VgError::InvalidGvgCount { got: 0 });
        let too_many: Vec<GvgId> = (1..=51).collect();
        let err = fx.svc.swap_out(&mut ctx, addr(10), 1, &too_many, 2, &approval).unwrap_err();
        assert_eq!(err, VgError::InvalidGvgCount { got: 51 });
    }

    #[test]
    fn test_sp_exit_requires_drained() {
        let fx = fixture(2);
        let mut ctx = Context::new(&fx.store, BlockContext::new(2, 200));
        let gvg_id = fx
            .svc
            .create_global_virtual_group(&mut ctx, addr(10), 0, vec![2], 1_000, "umoca")
            .unwrap();

        fx.svc.sp_exit(&mut ctx, addr(10)).unwrap();
        let err = fx.svc.complete_sp_exit(&mut ctx, addr(10)).unwrap_err();
        assert_eq!(err, VgError::SpNotDrained { sp_id: 1 });

        fx.svc.delete_global_virtual_group(&mut ctx, addr(10), gvg_id).unwrap();
        // SP 1 is still a secondary of nothing and its family is empty now
        fx.svc.complete_sp_exit(&mut ctx, addr(10)).unwrap();
        assert!(fx.sp_svc.get_sp(&ctx.store, 1).is_none());
    }
}
