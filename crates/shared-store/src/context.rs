//! # Message Context
//!
//! Everything a handler sees: the block context, the write overlay, the
//! gas meter and the event collector. `run_scoped` gives the atomic
//! sub-transaction used for per-message rollback and nested EVM
//! snapshots: commit the child's writes and events on `Ok`, keep only
//! its gas consumption on `Err`.

use crate::cache::{apply_writes, CacheContext};
use crate::events::EventManager;
use crate::gas::GasMeter;
use crate::kv::KvRead;
use shared_types::BlockContext;

/// Per-message execution context.
pub struct Context<'a> {
    /// The consensus-fixed block height and time.
    pub block: BlockContext,
    /// The message's write overlay.
    pub store: CacheContext<'a>,
    /// The message's gas meter.
    pub gas: GasMeter,
    /// The message's event collector.
    pub events: EventManager,
    /// Set only by system flows that may mutate frozen stream records.
    pub force_update: bool,
}

impl<'a> Context<'a> {
    /// Context over `base` with an infinite gas meter (system flows,
    /// begin/end blockers).
    pub fn new(base: &'a dyn KvRead, block: BlockContext) -> Self {
        Self {
            block,
            store: CacheContext::new(base),
            gas: GasMeter::infinite(),
            events: EventManager::new(),
            force_update: false,
        }
    }

    /// Context with a transaction gas limit.
    pub fn with_gas_limit(base: &'a dyn KvRead, block: BlockContext, gas_limit: u64) -> Self {
        Self {
            block,
            store: CacheContext::new(base),
            gas: GasMeter::new(gas_limit),
            events: EventManager::new(),
            force_update: false,
        }
    }

    /// Run `f` in a child overlay. On `Ok` the child's writes and events
    /// merge into this context; on `Err` only gas consumption survives.
    pub fn run_scoped<R, E>(
        &mut self,
        f: impl FnOnce(&mut Context<'_>) -> Result<R, E>,
    ) -> Result<R, E> {
        let mut child = Context {
            block: self.block,
            store: CacheContext::new(&self.store),
            gas: self.gas.clone(),
            events: EventManager::new(),
            force_update: self.force_update,
        };
        let result = f(&mut child);
        let consumed = child.gas.consumed();
        match result {
            Ok(value) => {
                let Context { store, mut events, .. } = child;
                let writes = store.into_writes();
                apply_writes(&mut self.store, writes);
                self.events.extend(events.take());
                self.gas.set_consumed(consumed);
                Ok(value)
            }
            Err(err) => {
                drop(child);
                self.gas.set_consumed(consumed);
                Err(err)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use crate::kv::KvWrite;
    use crate::memory::MemStore;
    use shared_types::BlockContext;

    #[test]
    fn test_scoped_commit() {
        let base = MemStore::new();
        let mut ctx = Context::new(&base, BlockContext::new(1, 100));

        let out: Result<u32, ()> = ctx.run_scoped(|child| {
            child.store.set(vec![1], vec![2]);
            child.events.emit(Event::new("inner", vec![]));
            Ok(7)
        });

        assert_eq!(out, Ok(7));
        assert_eq!(ctx.store.get(&[1]), Some(vec![2]));
        assert_eq!(ctx.events.events().len(), 1);
    }

    #[test]
    fn test_scoped_rollback_keeps_gas() {
        let base = MemStore::new();
        let mut ctx = Context::with_gas_limit(&base, BlockContext::new(1, 100), 1000);

        let out: Result<(), &str> = ctx.run_scoped(|child| {
            child.store.set(vec![1], vec![2]);
            child.gas.consume(300).unwrap();
            child.events.emit(Event::new("inner", vec![]));
            Err("boom")
        });

        assert_eq!(out, Err("boom"));
        // Writes and events rolled back, gas kept
        assert_eq!(ctx.store.get(&[1]), None);
        assert!(ctx.events.events().is_empty());
        assert_eq!(ctx.gas.consumed(), 300);
    }
}
