//! # Hardfork Scheduler
//!
//! Node config may carry a `{height → plan}` map. At the top of every
//! BeginBlock the scheduler consults it; a configured plan is written
//! once. An existing plan at the same height under a different name is
//! a split-brain configuration and the node halts.

use crate::keys;
use serde::{Deserialize, Serialize};
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, Event};
use std::collections::BTreeMap;
use tracing::info;

/// One configured hardfork.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardforkEntry {
    /// Plan name; must be non-empty.
    pub name: String,
    /// Free-form upgrade info (release URLs etc.).
    pub info: String,
}

/// A plan written to state, awaiting its height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePlan {
    /// Plan name.
    pub name: String,
    /// Activation height.
    pub height: u64,
    /// Free-form upgrade info.
    pub info: String,
}

/// Validate a configured hardfork map: positive decimal heights and
/// non-empty names.
pub fn validate_hardforks(hardforks: &BTreeMap<String, HardforkEntry>) -> Result<(), String> {
    for (height_str, entry) in hardforks {
        let height: u64 = height_str
            .parse()
            .map_err(|_| format!("hardfork height {height_str:?} is not a decimal number"))?;
        if height == 0 {
            return Err(format!("hardfork height {height_str:?} must be positive"));
        }
        if entry.name.is_empty() {
            return Err(format!("hardfork at height {height_str} has an empty name"));
        }
    }
    Ok(())
}

/// Run the scheduler for this block.
///
/// # Panics
///
/// Panics when a plan already sits at the height under a different
/// name.
pub fn schedule_configured_hardfork(
    ctx: &mut Context<'_>,
    hardforks: &BTreeMap<String, HardforkEntry>,
) {
    let Some(entry) = hardforks.get(&ctx.block.height.to_string()) else {
        return;
    };
    let key = keys::plan_key(ctx.block.height);
    if let Some(existing) = get_obj::<UpgradePlan>(&ctx.store, &key) {
        if existing.name != entry.name {
            panic!(
                "conflicting upgrade plans at height {}: scheduled {:?}, configured {:?}",
                ctx.block.height, existing.name, entry.name
            );
        }
        return; // already scheduled
    }
    let plan = UpgradePlan {
        name: entry.name.clone(),
        height: ctx.block.height,
        info: entry.info.clone(),
    };
    put_obj(&mut ctx.store, key, &plan);
    info!(name = %plan.name, height = plan.height, "hardfork scheduled from node config");
    ctx.events.emit(Event::new(
        "schedule_upgrade",
        vec![
            ("name".to_string(), plan.name.clone()),
            ("height".to_string(), plan.height.to_string()),
        ],
    ));
}

/// Plan due at `height`, if one was scheduled.
pub fn plan_at(store: &dyn shared_store::KvRead, height: u64) -> Option<UpgradePlan> {
    get_obj(store, &keys::plan_key(height))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shared_store::MemStore;
    use shared_types::BlockContext;

    fn forks(height: &str, name: &str) -> BTreeMap<String, HardforkEntry> {
        let mut map = BTreeMap::new();
        map.insert(
            height.to_string(),
            HardforkEntry { name: name.to_string(), info: String::new() },
        );
        map
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        assert!(validate_hardforks(&forks("100", "v2")).is_ok());
        assert!(validate_hardforks(&forks("0", "v2")).is_err());
        assert!(validate_hardforks(&forks("abc", "v2")).is_err());
        assert!(validate_hardforks(&forks("100", "")).is_err());
    }

    #[test]
    fn test_schedules_once() {
        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(100, 1));
        let map = forks("100", "v2");
        schedule_configured_hardfork(&mut ctx, &map);
        assert_eq!(plan_at(&ctx.store, 100).unwrap().name, "v2");
        // Second run is idempotent
        schedule_configured_hardfork(&mut ctx, &map);
        assert_eq!(ctx.events.events().len(), 1);
    }

    #[test]
    #[should_panic(expected = "conflicting upgrade plans")]
    fn test_name_conflict_panics() {
        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(100, 1));
        schedule_configured_hardfork(&mut ctx, &forks("100", "v2"));
        schedule_configured_hardfork(&mut ctx, &forks("100", "v3"));
    }
}
