//! # Block Lifecycle Controller
//!
//! Drives the fixed module hook ordering and the post-block
//! reconciliation. Locally implemented modules register hooks by name
//! (the container wires payment auto-settle and the storage GC pass);
//! SDK-owned slots run empty but keep their relative positions, so
//! local hooks fire at the same point on every node.

use crate::hardfork::{self, HardforkEntry};
use crate::ordering::{BEGIN_BLOCK_ORDER, END_BLOCK_ORDER};
use crate::upgrade::UpgradeHandlerRegistry;
use mc_01_payment::domain::invariants as payment_invariants;
use mc_01_payment::StreamRecord;
use shared_store::bank::{balance_key, supply_key};
use shared_store::diff::{diff_snapshots, snapshot_namespace};
use shared_store::kv::namespaces;
use shared_store::{Context, KvRead};
use shared_types::Uint;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A module's begin- or end-block hook.
pub type ModuleHook = Box<dyn Fn(&mut Context<'_>) + Send + Sync>;

/// Periodic payment invariant check settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentCheck {
    /// Whether the check runs at all.
    pub enabled: bool,
    /// Blocks between checks.
    pub interval: u64,
}

impl Default for PaymentCheck {
    fn default() -> Self {
        Self { enabled: false, interval: 100 }
    }
}

/// Snapshots taken before a block for reconciliation.
pub struct BlockSnapshots {
    bank: BTreeMap<Vec<u8>, Vec<u8>>,
    payment: BTreeMap<Vec<u8>, Vec<u8>>,
}

/// The lifecycle controller.
pub struct BlockLifecycle {
    begin_hooks: BTreeMap<&'static str, ModuleHook>,
    end_hooks: BTreeMap<&'static str, ModuleHook>,
    upgrades: UpgradeHandlerRegistry,
    payment_check: PaymentCheck,
}

impl BlockLifecycle {
    /// Controller with no hooks registered yet.
    pub fn new(upgrades: UpgradeHandlerRegistry, payment_check: PaymentCheck) -> Self {
        Self {
            begin_hooks: BTreeMap::new(),
            end_hooks: BTreeMap::new(),
            upgrades,
            payment_check,
        }
    }

    /// Register a begin-block hook under a module name from the order
    /// table.
    pub fn on_begin(&mut self, module: &'static str, hook: ModuleHook) {
        assert!(
            BEGIN_BLOCK_ORDER.contains(&module),
            "module {module:?} is not in the begin-block order"
        );
        if self.begin_hooks.insert(module, hook).is_some() {
            panic!("begin hook for {module:?} registered twice");
        }
    }

    /// Register an end-block hook under a module name from the order
    /// table.
    pub fn on_end(&mut self, module: &'static str, hook: ModuleHook) {
        assert!(
            END_BLOCK_ORDER.contains(&module),
            "module {module:?} is not in the end-block order"
        );
        if self.end_hooks.insert(module, hook).is_some() {
            panic!("end hook for {module:?} registered twice");
        }
    }

    /// PreBlock: apply an upgrade plan due at this height.
    pub fn pre_block(&self, ctx: &mut Context<'_>) {
        if let Some(plan) = hardfork::plan_at(&ctx.store, ctx.block.height) {
            self.upgrades.apply(ctx, &plan);
        }
    }

    /// BeginBlock: hardfork scheduling first, then the ordered module
    /// begin-blockers.
    pub fn begin_block(&self, ctx: &mut Context<'_>, hardforks: &BTreeMap<String, HardforkEntry>) {
        hardfork::schedule_configured_hardfork(ctx, hardforks);
        for module in BEGIN_BLOCK_ORDER {
            if let Some(hook) = self.begin_hooks.get(module) {
                hook(ctx);
            }
        }
    }

    /// EndBlock: ordered module end-blockers, fee market last (it needs
    /// the block's final gas usage).
    pub fn end_block(&self, ctx: &mut Context<'_>) {
        for module in END_BLOCK_ORDER {
            match module {
                "payment" => {
                    if let Some(hook) = self.end_hooks.get("payment") {
                        hook(ctx);
                    }
                    self.maybe_check_payment(ctx);
                }
                "feemarket" => {
                    debug!(gas_used = ctx.gas.consumed(), "fee market closing block");
                }
                other => {
                    if let Some(hook) = self.end_hooks.get(other) {
                        hook(ctx);
                    }
                }
            }
        }
    }

    fn maybe_check_payment(&self, ctx: &Context<'_>) {
        if !self.payment_check.enabled || self.payment_check.interval == 0 {
            return;
        }
        if ctx.block.height % self.payment_check.interval != 0 {
            return;
        }
        if !payment_invariants::check_global_netflow_zero(&ctx.store) {
            panic!("payment invariant violated: global netflow sum is nonzero");
        }
        for (_, bytes) in ctx.store.scan_prefix(&mc_01_payment::keys::stream_record_prefix()) {
            let record: StreamRecord = bincode::deserialize(&bytes)
                .unwrap_or_else(|e| panic!("corrupt stream record: {e}"));
            if !payment_invariants::check_outflow_consistency(&ctx.store, &record) {
                panic!("payment invariant violated: outflow sum mismatch for {}", record.account);
            }
        }
        info!(height = ctx.block.height, "payment invariant check passed");
    }

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    /// Snapshot the bank and payment namespaces before the block.
    pub fn snapshot(&self, store: &dyn KvRead) -> BlockSnapshots {
        BlockSnapshots {
            bank: snapshot_namespace(store, namespaces::BANK),
            payment: snapshot_namespace(store, namespaces::PAYMENT),
        }
    }

    /// Diff the committed state against the pre-block snapshots:
    ///
    /// - the total bank balance delta must equal the supply delta
    ///   (transfers conserve; only mint/burn moves supply)
    /// - the payment escrow's bank delta must equal the delta of all
    ///   stream values. A record's value is
    ///   `static + buffer + lock + netflow·(time − settle_ts)`: the
    ///   accrual term makes the measure invariant under lazy
    ///   settlement, which moves accrual into the static balance
    ///   without touching the bank.
    ///
    /// Both sides evaluate at the same `time` so in-flight accrual
    /// between two stream endpoints cancels.
    ///
    /// # Panics
    ///
    /// Panics on violation; divergence here is consensus-critical.
    pub fn reconcile(&self, snapshots: &BlockSnapshots, store: &dyn KvRead, height: u64, time: i64) {
        let bank_after = snapshot_namespace(store, namespaces::BANK);
        let bank_deltas = diff_snapshots(&snapshots.bank, &bank_after);

        let escrow_prefix = balance_key(mc_01_payment::service::payment_module_address(), "");
        let supply_prefix = supply_key("");
        let mut balance_delta: i128 = 0;
        let mut supply_delta: i128 = 0;
        let mut escrow_delta: i128 = 0;
        for delta in &bank_deltas {
            let diff = amount_of(delta.after.as_deref()) - amount_of(delta.before.as_deref());
            if delta.key.starts_with(&supply_prefix) {
                supply_delta += diff;
            } else {
                balance_delta += diff;
                if delta.key.starts_with(&escrow_prefix) {
                    escrow_delta += diff;
                }
            }
        }
        if balance_delta != supply_delta {
            panic!(
                "reconciliation failed at height {height}: bank delta {balance_delta} != supply delta {supply_delta}"
            );
        }

        let payment_after = snapshot_namespace(store, namespaces::PAYMENT);
        let payment_deltas = diff_snapshots(&snapshots.payment, &payment_after);
        let record_prefix = mc_01_payment::keys::stream_record_prefix();
        let mut stream_delta: i128 = 0;
        for delta in &payment_deltas {
            if !delta.key.starts_with(&record_prefix) {
                continue;
            }
            stream_delta += stream_value(delta.after.as_deref(), time)
                - stream_value(delta.before.as_deref(), time);
        }
        if escrow_delta != stream_delta {
            panic!(
                "reconciliation failed at height {height}: escrow delta {escrow_delta} != stream balance delta {stream_delta}"
            );
        }
        debug!(height, "block reconciliation passed");
    }
}

fn amount_of(value: Option<&[u8]>) -> i128 {
    match value {
        Some(bytes) if bytes.len() == 32 => Uint::from_big_endian(bytes).low_u128() as i128,
        _ => 0,
    }
}

fn stream_value(value: Option<&[u8]>, time: i64) -> i128 {
    match value {
        Some(bytes) => {
            let record: StreamRecord = bincode::deserialize(bytes)
                .unwrap_or_else(|e| panic!("corrupt stream record: {e}"));
            let accrual = record.netflow_rate * (time - record.settle_timestamp).max(0) as i128;
            record.static_balance
                + record.buffer_balance as i128
                + record.lock_balance as i128
                + accrual
        }
        None => 0,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shared_store::bank::{BankApi, BankStore};
    use shared_store::cache::apply_writes;
    use shared_store::{KvWrite, MemStore};
    use shared_types::{Address, BlockContext, Coin};

    fn lifecycle() -> BlockLifecycle {
        BlockLifecycle::new(UpgradeHandlerRegistry::with_known_upgrades(), PaymentCheck::default())
    }

    #[test]
    fn test_hooks_run_in_table_order() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let order = Arc::new(AtomicUsize::new(0));
        let mut lifecycle = lifecycle();
        let seen_payment = Arc::new(AtomicUsize::new(0));
        let seen_storage = Arc::new(AtomicUsize::new(0));
        {
            let order = order.clone();
            let seen = seen_payment.clone();
            lifecycle.on_end(
                "payment",
                Box::new(move |_| {
                    seen.store(order.fetch_add(1, Ordering::SeqCst) + 1, Ordering::SeqCst);
                }),
            );
        }
        {
            let order = order.clone();
            let seen = seen_storage.clone();
            lifecycle.on_end(
                "storage",
                Box::new(move |_| {
                    seen.store(order.fetch_add(1, Ordering::SeqCst) + 1, Ordering::SeqCst);
                }),
            );
        }

        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(1, 1));
        lifecycle.end_block(&mut ctx);
        // Payment ends before storage in the table
        assert_eq!(seen_payment.load(Ordering::SeqCst), 1);
        assert_eq!(seen_storage.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[should_panic(expected = "not in the begin-block order")]
    fn test_unknown_module_hook_rejected() {
        let mut lifecycle = lifecycle();
        lifecycle.on_begin("mystery", Box::new(|_| {}));
    }

    #[test]
    fn test_reconcile_passes_on_plain_transfer() {
        let bank = BankStore;
        let mut store = MemStore::new();
        bank.mint(&mut store, Address::new([1; 20]), &Coin::new("umoca", Uint::from(100u64)));

        let lifecycle = lifecycle();
        let snapshots = lifecycle.snapshot(&store);

        let mut ctx = Context::new(&store, BlockContext::new(5, 50));
        bank.transfer(
            &mut ctx.store,
            Address::new([1; 20]),
            Address::new([2; 20]),
            &Coin::new("umoca", Uint::from(40u64)),
        )
        .unwrap();
        let writes = ctx.store.into_writes();
        apply_writes(&mut store, writes);

        lifecycle.reconcile(&snapshots, &store, 5, 50);
    }

    #[test]
    #[should_panic(expected = "reconciliation failed")]
    fn test_reconcile_catches_conjured_balance() {
        let mut store = MemStore::new();
        let lifecycle = lifecycle();
        let snapshots = lifecycle.snapshot(&store);

        // Balance appears out of thin air without a supply change
        let mut bytes = [0u8; 32];
        Uint::from(1_000u64).to_big_endian(&mut bytes);
        store.set(balance_key(Address::new([9; 20]), "umoca"), bytes.to_vec());

        lifecycle.reconcile(&snapshots, &store, 6, 60);
    }

    #[test]
    fn test_mint_reconciles_through_supply() {
        let bank = BankStore;
        let mut store = MemStore::new();
        let lifecycle = lifecycle();
        let snapshots = lifecycle.snapshot(&store);

        bank.mint(&mut store, Address::new([1; 20]), &Coin::new("umoca", Uint::from(500u64)));
        lifecycle.reconcile(&snapshots, &store, 7, 70);
    }
}
