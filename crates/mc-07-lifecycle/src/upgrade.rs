//! # Upgrade Handlers
//!
//! Per-named-plan functions `(ctx, plan, from_versions) → new_versions`.
//! A plan due at the current height without a registered handler halts
//! the node: running on without migrating is worse than stopping.

use crate::hardfork::UpgradePlan;
use crate::keys;
use crate::params::{EvmParams, GovParams};
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, KvWrite};
use std::collections::BTreeMap;
use tracing::info;

/// Module name → consensus version.
pub type VersionMap = BTreeMap<String, u64>;

/// An upgrade handler body.
pub type UpgradeHandler =
    Box<dyn Fn(&mut Context<'_>, &UpgradePlan, VersionMap) -> VersionMap + Send + Sync>;

/// Registry of handlers by plan name.
#[derive(Default)]
pub struct UpgradeHandlerRegistry {
    handlers: BTreeMap<String, UpgradeHandler>,
}

impl UpgradeHandlerRegistry {
    /// Registry preloaded with the known network upgrades.
    pub fn with_known_upgrades() -> Self {
        let mut registry = Self::default();
        registry.register("testnet-gov-param-fix", testnet_gov_param_fix);
        registry
    }

    /// Register a handler for a plan name.
    pub fn register(
        &mut self,
        name: &str,
        handler: impl Fn(&mut Context<'_>, &UpgradePlan, VersionMap) -> VersionMap
            + Send
            + Sync
            + 'static,
    ) {
        if self.handlers.insert(name.to_string(), Box::new(handler)).is_some() {
            panic!("upgrade handler {name:?} registered twice");
        }
    }

    /// Apply a due plan.
    ///
    /// # Panics
    ///
    /// Panics when no handler is registered for the plan's name.
    pub fn apply(&self, ctx: &mut Context<'_>, plan: &UpgradePlan) {
        let handler = self
            .handlers
            .get(&plan.name)
            .unwrap_or_else(|| panic!("upgrade {:?} has no registered handler", plan.name));
        let from: VersionMap = get_obj(&ctx.store, &keys::version_map_key()).unwrap_or_default();
        info!(name = %plan.name, height = plan.height, "applying upgrade");
        let next = handler(ctx, plan, from);
        put_obj(&mut ctx.store, keys::version_map_key(), &next);
        ctx.store.delete(&keys::plan_key(plan.height));
    }
}

/// `testnet-gov-param-fix`: set the gov minimum deposit ratio to 0.01
/// and allow unprotected EVM transactions, then run migrations.
fn testnet_gov_param_fix(
    ctx: &mut Context<'_>,
    _plan: &UpgradePlan,
    from: VersionMap,
) -> VersionMap {
    let mut gov: GovParams = get_obj(&ctx.store, &keys::gov_params_key()).unwrap_or_default();
    gov.min_deposit_ratio = "0.010000000000000000".to_string();
    put_obj(&mut ctx.store, keys::gov_params_key(), &gov);

    let mut evm: EvmParams = get_obj(&ctx.store, &keys::evm_params_key()).unwrap_or_default();
    evm.allow_unprotected_txs = true;
    put_obj(&mut ctx.store, keys::evm_params_key(), &evm);

    run_migrations(from)
}

/// Bump every registered module to its current consensus version.
fn run_migrations(mut versions: VersionMap) -> VersionMap {
    for module in ["payment", "sp", "virtualgroup", "storage", "crosschain"] {
        let entry = versions.entry(module.to_string()).or_insert(0);
        *entry += 1;
    }
    versions
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shared_store::{KvWrite, MemStore};
    use shared_types::BlockContext;

    #[test]
    fn test_gov_param_fix_handler() {
        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(500, 1));
        let registry = UpgradeHandlerRegistry::with_known_upgrades();
        let plan = UpgradePlan {
            name: "testnet-gov-param-fix".to_string(),
            height: 500,
            info: String::new(),
        };
        shared_store::kv::put_obj(&mut ctx.store, crate::keys::plan_key(500), &plan);

        registry.apply(&mut ctx, &plan);

        let gov: GovParams =
            shared_store::kv::get_obj(&ctx.store, &crate::keys::gov_params_key()).unwrap();
        assert_eq!(gov.min_deposit_ratio, "0.010000000000000000");
        let evm: EvmParams =
            shared_store::kv::get_obj(&ctx.store, &crate::keys::evm_params_key()).unwrap();
        assert!(evm.allow_unprotected_txs);
        let versions: VersionMap =
            shared_store::kv::get_obj(&ctx.store, &crate::keys::version_map_key()).unwrap();
        assert_eq!(versions["storage"], 1);
        // The consumed plan is gone
        assert!(crate::hardfork::plan_at(&ctx.store, 500).is_none());
    }

    #[test]
    #[should_panic(expected = "no registered handler")]
    fn test_unknown_plan_panics() {
        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(500, 1));
        let registry = UpgradeHandlerRegistry::default();
        let plan = UpgradePlan { name: "mystery".to_string(), height: 500, info: String::new() };
        registry.apply(&mut ctx, &plan);
    }
}
