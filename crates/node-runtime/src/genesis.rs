//! # Genesis Builder
//!
//! Seeds module params, initial balances and the first price snapshot.
//! Module account addresses derive once here and are treated read-only
//! afterwards.

use crate::container::App;
use mc_01_payment::PaymentParams;
use mc_02_sp_registry::SpParams;
use mc_03_virtual_group::VgParams;
use mc_04_storage::{StorageParams, VersionedParams};
use shared_store::bank::BankApi;
use shared_types::{Address, Coin, Uint};
use tracing::info;

/// Accumulates genesis state before committing it in one pass.
#[derive(Default)]
pub struct GenesisBuilder {
    balances: Vec<(Address, Coin)>,
    payment_params: Option<PaymentParams>,
    sp_params: Option<SpParams>,
    vg_params: Option<VgParams>,
    storage_params: Option<StorageParams>,
    versioned_params: Option<VersionedParams>,
}

impl GenesisBuilder {
    /// Empty builder; defaults apply for anything not overridden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint an initial balance.
    pub fn with_balance(mut self, addr: Address, amount: u128, denom: &str) -> Self {
        self.balances.push((addr, Coin::new(denom, Uint::from(amount))));
        self
    }

    /// Override payment params.
    pub fn with_payment_params(mut self, params: PaymentParams) -> Self {
        self.payment_params = Some(params);
        self
    }

    /// Override SP registry params.
    pub fn with_sp_params(mut self, params: SpParams) -> Self {
        self.sp_params = Some(params);
        self
    }

    /// Override virtual-group params.
    pub fn with_vg_params(mut self, params: VgParams) -> Self {
        self.vg_params = Some(params);
        self
    }

    /// Override storage params.
    pub fn with_storage_params(mut self, params: StorageParams) -> Self {
        self.storage_params = Some(params);
        self
    }

    /// Set the first versioned params entry.
    pub fn with_versioned_params(mut self, params: VersionedParams) -> Self {
        self.versioned_params = Some(params);
        self
    }

    /// Commit everything into the app's store at height zero.
    pub fn apply(self, app: &App) {
        app.apply_genesis(|ctx| {
            for (addr, coin) in &self.balances {
                app.bank.mint(&mut ctx.store, *addr, coin);
            }
            if let Some(params) = &self.payment_params {
                app.payment.set_params(&mut ctx.store, params);
            }
            if let Some(params) = &self.sp_params {
                app.sp.set_params(&mut ctx.store, params);
            }
            if let Some(params) = &self.vg_params {
                app.vg.set_params(&mut ctx.store, params);
            }
            if let Some(params) = &self.storage_params {
                app.storage.set_params(&mut ctx.store, params);
            }
            if let Some(params) = &self.versioned_params {
                app.storage.append_versioned_params(&mut ctx.store, params);
            }
        });
        info!("genesis build complete");
    }
}
