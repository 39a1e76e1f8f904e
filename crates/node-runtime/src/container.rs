//! # Service Container
//!
//! Builds every service once, wires the ports, and late-binds the
//! virtual-group → storage handle (the two engines reference each
//! other; construction order cannot satisfy both, so the handle is set
//! after both exist). All block processing funnels through
//! [`App::run_block`], the single deterministic execution lane.

use crate::config::AppConfig;
use mc_01_payment::PaymentService;
use mc_02_sp_registry::SpService;
use mc_03_virtual_group::VirtualGroupService;
use mc_04_storage::StorageService;
use mc_05_cross_chain::channels::{
    BucketChannel, GroupChannel, ObjectChannel, PermissionChannel, SbtChannel, VcChannel,
};
use mc_05_cross_chain::{channel_ids, CrossChainDispatcher};
use mc_06_evm_precompiles::adapters::{
    GovPrecompile, PaymentPrecompile, PermissionPrecompile, StoragePrecompile,
    VirtualGroupPrecompile,
};
use mc_06_evm_precompiles::{ObjectNftAdapter, PrecompileSet};
use mc_07_lifecycle::{BlockLifecycle, UpgradeHandlerRegistry};
use parking_lot::RwLock;
use shared_store::bank::BankStore;
use shared_store::cache::apply_writes;
use shared_store::{Context, KvRead, MemStore};
use shared_types::{module_address, BlockContext};
use std::sync::Arc;
use tracing::{debug, info};

/// The assembled node.
pub struct App {
    /// Validated node configuration.
    pub config: AppConfig,
    store: RwLock<MemStore>,
    /// Bank keeper.
    pub bank: Arc<BankStore>,
    /// Stream payment engine.
    pub payment: Arc<PaymentService>,
    /// SP registry.
    pub sp: Arc<SpService>,
    /// Virtual-group engine.
    pub vg: Arc<VirtualGroupService>,
    /// Storage engine.
    pub storage: Arc<StorageService>,
    /// Cross-chain packet dispatcher.
    pub dispatcher: CrossChainDispatcher,
    /// EVM precompile registry.
    pub precompiles: PrecompileSet,
    lifecycle: BlockLifecycle,
}

impl App {
    /// Build and wire every subsystem over an in-memory store.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;

        let bank = Arc::new(BankStore);
        let authority = module_address("gov");
        let payment = Arc::new(PaymentService::new(bank.clone()));
        let sp = Arc::new(SpService::new(bank.clone(), authority));
        let vg = Arc::new(VirtualGroupService::new(bank.clone(), payment.clone(), sp.clone()));
        let nft = Arc::new(ObjectNftAdapter);
        let storage =
            Arc::new(StorageService::new(payment.clone(), sp.clone(), vg.clone(), nft));
        // Constructor-then-setter: close the VG ↔ storage cycle.
        vg.set_storage_api(storage.clone());

        let mut dispatcher = CrossChainDispatcher::new();
        dispatcher.register(channel_ids::BUCKET, Arc::new(BucketChannel::new(storage.clone())));
        dispatcher.register(channel_ids::OBJECT, Arc::new(ObjectChannel::new(storage.clone())));
        dispatcher.register(channel_ids::GROUP, Arc::new(GroupChannel::new(storage.clone())));
        dispatcher
            .register(channel_ids::PERMISSION, Arc::new(PermissionChannel::new(storage.clone())));
        dispatcher.register(channel_ids::MOCA_SBT, Arc::new(SbtChannel));
        dispatcher.register(channel_ids::MOCA_VC, Arc::new(VcChannel));

        let mut precompiles = PrecompileSet::new();
        precompiles.register(Arc::new(StoragePrecompile::new(storage.clone())));
        precompiles.register(Arc::new(PermissionPrecompile::new(storage.clone())));
        precompiles.register(Arc::new(VirtualGroupPrecompile::new(vg.clone())));
        precompiles.register(Arc::new(PaymentPrecompile::new(payment.clone())));
        precompiles.register(Arc::new(GovPrecompile));

        let mut lifecycle = BlockLifecycle::new(
            UpgradeHandlerRegistry::with_known_upgrades(),
            config.payment_check.clone(),
        );
        {
            let payment = payment.clone();
            lifecycle.on_begin("payment", Box::new(move |ctx| payment.auto_settle(ctx)));
        }
        {
            let storage = storage.clone();
            lifecycle.on_end("storage", Box::new(move |ctx| storage.end_blocker(ctx)));
        }

        info!("service container wired");
        Ok(Self {
            config,
            store: RwLock::new(MemStore::new()),
            bank,
            payment,
            sp,
            vg,
            storage,
            dispatcher,
            precompiles,
            lifecycle,
        })
    }

    /// Run one block: pre/begin hooks, the caller's deliveries, end
    /// hooks, commit, then reconciliation against the pre-block
    /// snapshots.
    pub fn run_block<R>(
        &self,
        height: u64,
        time: i64,
        deliver: impl FnOnce(&mut Context<'_>) -> R,
    ) -> R {
        let mut store = self.store.write();
        let snapshots = self.lifecycle.snapshot(&*store);

        let mut ctx = Context::new(&*store, BlockContext::new(height, time));
        self.lifecycle.pre_block(&mut ctx);
        self.lifecycle.begin_block(&mut ctx, &self.config.hardforks);
        let out = deliver(&mut ctx);
        self.lifecycle.end_block(&mut ctx);

        let events = ctx.events.take();
        let writes = ctx.store.into_writes();
        apply_writes(&mut *store, writes);
        debug!(height, events = events.len(), "block committed");

        self.lifecycle.reconcile(&snapshots, &*store, height, time);
        out
    }

    /// Seed genesis state outside the block flow (height 0).
    pub fn apply_genesis(&self, seed: impl FnOnce(&mut Context<'_>)) {
        let mut store = self.store.write();
        let mut ctx = Context::new(&*store, BlockContext::new(0, 0));
        seed(&mut ctx);
        let writes = ctx.store.into_writes();
        apply_writes(&mut *store, writes);
        info!("genesis state committed");
    }

    /// Read-only access at the latest committed state.
    pub fn query<R>(&self, f: impl FnOnce(&dyn KvRead) -> R) -> R {
        let store = self.store.read();
        f(&*store)
    }
}
