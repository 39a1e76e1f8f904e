//! # Precompile Execution
//!
//! `execute_precompile` meters the dynamic gas, then runs the adapter
//! inside a child cache context: an error discards the child (reverting
//! the EVM snapshot and the store writes together) and surfaces
//! ABI-packed revert data; success commits the child and appends the
//! call's logs.

use crate::errors::PrecompileError;
use shared_store::{Context, StoreError};
use shared_types::{Address, Hash};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// One emitted EVM log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvmLog {
    /// Emitting contract address.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<Hash>,
    /// Unindexed data.
    pub data: Vec<u8>,
}

/// Result of a successful precompile call.
#[derive(Clone, Debug, Default)]
pub struct PrecompileOutput {
    /// ABI-encoded return data.
    pub output: Vec<u8>,
    /// Logs to append to the EVM receipt.
    pub logs: Vec<EvmLog>,
}

/// A natively implemented contract at a fixed address.
pub trait Precompile: Send + Sync {
    /// The fixed address this precompile lives at.
    fn address(&self) -> Address;

    /// Base gas plus the arity surcharge for this calldata.
    fn required_gas(&self, input: &[u8]) -> u64;

    /// Execute against the child context the runner provides.
    fn run(
        &self,
        ctx: &mut Context<'_>,
        caller: Address,
        input: &[u8],
    ) -> Result<PrecompileOutput, PrecompileError>;
}

/// Registry of precompiles by address.
#[derive(Default)]
pub struct PrecompileSet {
    precompiles: BTreeMap<Address, Arc<dyn Precompile>>,
}

impl PrecompileSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a precompile at its fixed address.
    pub fn register(&mut self, precompile: Arc<dyn Precompile>) {
        let address = precompile.address();
        if self.precompiles.insert(address, precompile).is_some() {
            panic!("precompile at {address} registered twice");
        }
    }

    /// Look up by address.
    pub fn get(&self, address: Address) -> Option<&Arc<dyn Precompile>> {
        self.precompiles.get(&address)
    }
}

/// Run a precompile call. Returns `None` when no precompile lives at
/// `address` (the caller falls through to ordinary EVM execution).
/// On error the returned `Err` carries ABI-packed revert data.
pub fn execute_precompile(
    set: &PrecompileSet,
    ctx: &mut Context<'_>,
    caller: Address,
    address: Address,
    input: &[u8],
) -> Option<Result<PrecompileOutput, Vec<u8>>> {
    let precompile = set.get(address)?;

    let required = precompile.required_gas(input);
    if let Err(StoreError::OutOfGas { .. }) = ctx.gas.consume(required) {
        return Some(Err(PrecompileError::OutOfGas.revert_data()));
    }

    let outcome = ctx.run_scoped(|child| precompile.run(child, caller, input));
    match outcome {
        Ok(output) => Some(Ok(output)),
        Err(err) => {
            debug!(%address, %err, "precompile reverted");
            Some(Err(err.revert_data()))
        }
    }
}

/// Calldata helpers shared by the adapters.
pub mod calldata {
    use super::PrecompileError;
    use ethabi::{decode, ParamType, Token};

    /// Split the 4-byte selector from the argument tail.
    pub fn split_selector(input: &[u8]) -> Result<([u8; 4], &[u8]), PrecompileError> {
        if input.len() < 4 {
            return Err(PrecompileError::InvalidInput("calldata shorter than selector".into()));
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&input[..4]);
        Ok((selector, &input[4..]))
    }

    /// Decode the argument tail against the method signature.
    pub fn decode_args(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, PrecompileError> {
        decode(types, data).map_err(|e| PrecompileError::InvalidInput(e.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shared_store::{KvRead, KvWrite, MemStore};
    use shared_types::BlockContext;

    struct Flaky {
        fail: bool,
    }

    impl Precompile for Flaky {
        fn address(&self) -> Address {
            crate::addresses::STORAGE
        }

        fn required_gas(&self, _input: &[u8]) -> u64 {
            1_000
        }

        fn run(
            &self,
            ctx: &mut Context<'_>,
            _caller: Address,
            _input: &[u8],
        ) -> Result<PrecompileOutput, PrecompileError> {
            ctx.store.set(vec![0xFF], vec![1]);
            if self.fail {
                return Err(PrecompileError::Reverted("boom".to_string()));
            }
            Ok(PrecompileOutput::default())
        }
    }

    #[test]
    fn test_success_commits_writes_and_charges_gas() {
        let mut set = PrecompileSet::new();
        set.register(Arc::new(Flaky { fail: false }));
        let store = MemStore::new();
        let mut ctx = Context::with_gas_limit(&store, BlockContext::new(1, 1), 10_000);

        let result =
            execute_precompile(&set, &mut ctx, Address::ZERO, crate::addresses::STORAGE, &[]);
        assert!(matches!(result, Some(Ok(_))));
        assert_eq!(ctx.store.get(&[0xFF]), Some(vec![1]));
        assert_eq!(ctx.gas.consumed(), 1_000);
    }

    #[test]
    fn test_revert_discards_writes_and_returns_revert_data() {
        let mut set = PrecompileSet::new();
        set.register(Arc::new(Flaky { fail: true }));
        let store = MemStore::new();
        let mut ctx = Context::with_gas_limit(&store, BlockContext::new(1, 1), 10_000);

        let result =
            execute_precompile(&set, &mut ctx, Address::ZERO, crate::addresses::STORAGE, &[]);
        let Some(Err(revert)) = result else { panic!("expected revert") };
        assert_eq!(&revert[..4], &[0x08, 0xC3, 0x79, 0xA0]);
        // Store write rolled back, gas still charged
        assert_eq!(ctx.store.get(&[0xFF]), None);
        assert_eq!(ctx.gas.consumed(), 1_000);
    }

    #[test]
    fn test_gas_limit_enforced_upfront() {
        let mut set = PrecompileSet::new();
        set.register(Arc::new(Flaky { fail: false }));
        let store = MemStore::new();
        let mut ctx = Context::with_gas_limit(&store, BlockContext::new(1, 1), 500);

        let result =
            execute_precompile(&set, &mut ctx, Address::ZERO, crate::addresses::STORAGE, &[]);
        assert!(matches!(result, Some(Err(_))));
        assert_eq!(ctx.store.get(&[0xFF]), None);
    }

    #[test]
    fn test_non_precompile_address_falls_through() {
        let set = PrecompileSet::new();
        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(1, 1));
        assert!(execute_precompile(&set, &mut ctx, Address::ZERO, Address::new([9; 20]), &[])
            .is_none());
    }
}
