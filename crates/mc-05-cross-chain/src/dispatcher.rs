//! # Packet Dispatcher
//!
//! Routes raw packages to channel apps by channel id and operation
//! byte. Handler failures roll the packet's writes back and produce a
//! fail ack carrying the original extra data; protocol violations
//! panic.

use crate::codec::{wrap_ack, AckStatus};
use crate::errors::BridgeError;
use shared_store::Context;
use shared_types::Uint;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Successful syn handling: the created/affected id plus the extra
/// data to echo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynResult {
    /// Entity id the ack carries.
    pub id: Uint,
    /// Extra data echoed back to the relayer.
    pub extra_data: Vec<u8>,
}

/// One channel's packet handlers. `op` arrives split from the payload;
/// decoders panic on operation bytes the channel does not define.
pub trait ChannelApp: Send + Sync {
    /// Handle an inbound syn package.
    fn execute_syn(&self, ctx: &mut Context<'_>, op: u8, payload: &[u8])
        -> Result<SynResult, BridgeError>;

    /// Handle an ack for a package this chain emitted.
    fn execute_ack(&self, ctx: &mut Context<'_>, op: u8, payload: &[u8])
        -> Result<(), BridgeError>;

    /// Handle a fail ack for a package this chain emitted.
    fn execute_fail_ack(&self, ctx: &mut Context<'_>, op: u8, payload: &[u8])
        -> Result<(), BridgeError>;
}

/// The channel registry and entry points.
pub struct CrossChainDispatcher {
    apps: BTreeMap<u8, Arc<dyn ChannelApp>>,
}

impl CrossChainDispatcher {
    /// Empty dispatcher.
    pub fn new() -> Self {
        Self { apps: BTreeMap::new() }
    }

    /// Register a channel app.
    pub fn register(&mut self, channel_id: u8, app: Arc<dyn ChannelApp>) {
        if self.apps.insert(channel_id, app).is_some() {
            panic!("channel {channel_id:#04x} registered twice");
        }
    }

    fn app(&self, channel_id: u8) -> &Arc<dyn ChannelApp> {
        self.apps
            .get(&channel_id)
            .unwrap_or_else(|| panic!("unknown cross-chain channel {channel_id:#04x}"))
    }

    fn split(raw: &[u8]) -> (u8, &[u8]) {
        if raw.is_empty() {
            panic!("empty cross-chain package");
        }
        (raw[0], &raw[1..])
    }

    /// Process an inbound syn package; returns the ack payload to emit,
    /// wrapped with the request's operation byte.
    pub fn execute_syn_package(
        &self,
        ctx: &mut Context<'_>,
        channel_id: u8,
        raw: &[u8],
    ) -> Vec<u8> {
        let app = self.app(channel_id);
        let (op, payload) = Self::split(raw);
        let outcome = ctx.run_scoped(|child| app.execute_syn(child, op, payload));
        match outcome {
            Ok(result) => wrap_ack(op, AckStatus::Success, result.id, &result.extra_data),
            Err(err) => {
                warn!(channel = channel_id, op, %err, "cross-chain syn rejected");
                wrap_ack(op, AckStatus::Fail, Uint::zero(), &err.extra_data())
            }
        }
    }

    /// Process an ack for a package this chain emitted.
    pub fn execute_ack_package(&self, ctx: &mut Context<'_>, channel_id: u8, raw: &[u8]) {
        let app = self.app(channel_id);
        let (op, payload) = Self::split(raw);
        let outcome = ctx.run_scoped(|child| app.execute_ack(child, op, payload));
        if let Err(err) = outcome {
            warn!(channel = channel_id, op, %err, "cross-chain ack rejected");
        }
    }

    /// Process a fail ack for a package this chain emitted.
    pub fn execute_fail_ack_package(&self, ctx: &mut Context<'_>, channel_id: u8, raw: &[u8]) {
        let app = self.app(channel_id);
        let (op, payload) = Self::split(raw);
        let outcome = ctx.run_scoped(|child| app.execute_fail_ack(child, op, payload));
        if let Err(err) = outcome {
            warn!(channel = channel_id, op, %err, "cross-chain fail ack rejected");
        }
    }
}

impl Default for CrossChainDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_ids;
    use crate::channels::{BucketChannel, SbtChannel};
    use crate::codec::unwrap_ack;
    use crate::packages::{ops, CreateBucketSynPackage, CreateBucketSynPackageV2, MintSbtSynPackage};
    use crate::ports::{BridgeCreateBucket, BridgePolicy, StorageBridgeApi};
    use parking_lot::Mutex;
    use shared_store::MemStore;
    use shared_types::{Address, BlockContext};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[derive(Default)]
    struct Recorder {
        created: Mutex<Vec<BridgeCreateBucket>>,
        reject: bool,
    }

    impl StorageBridgeApi for Recorder {
        fn create_bucket(
            &self,
            _ctx: &mut Context<'_>,
            msg: BridgeCreateBucket,
        ) -> Result<Uint, String> {
            if self.reject {
                return Err("bucket rejected".to_string());
            }
            self.created.lock().push(msg);
            Ok(Uint::from(42u64))
        }

        fn delete_bucket(&self, _: &mut Context<'_>, _: Address, _: Uint) -> Result<(), String> {
            unimplemented!()
        }
        fn ack_mirror_bucket(&self, _: &mut Context<'_>, _: Uint, _: bool) -> Result<(), String> {
            unimplemented!()
        }
        fn delete_object(&self, _: &mut Context<'_>, _: Address, _: Uint) -> Result<(), String> {
            unimplemented!()
        }
        fn ack_mirror_object(&self, _: &mut Context<'_>, _: Uint, _: bool) -> Result<(), String> {
            unimplemented!()
        }
        fn create_group(&self, _: &mut Context<'_>, _: Address, _: &str) -> Result<Uint, String> {
            unimplemented!()
        }
        fn delete_group(&self, _: &mut Context<'_>, _: Address, _: Uint) -> Result<(), String> {
            unimplemented!()
        }
        fn put_policy(&self, _: &mut Context<'_>, _: BridgePolicy) -> Result<Uint, String> {
            unimplemented!()
        }
        fn delete_policy(&self, _: &mut Context<'_>, _: BridgePolicy) -> Result<(), String> {
            unimplemented!()
        }
    }

    fn v2_package() -> CreateBucketSynPackageV2 {
        CreateBucketSynPackageV2 {
            base: CreateBucketSynPackage {
                creator: Address::new([1; 20]),
                bucket_name: "bridged".to_string(),
                payment_address: Address::ZERO,
                primary_sp_address: Address::new([3; 20]),
                expired_height: 999,
                approval_sig: vec![0xAB; 65],
                approval_msg_bytes: b"approval".to_vec(),
                charged_read_quota: 0,
                extra_data: b"relayer-tail".to_vec(),
            },
            global_virtual_group_family_id: 7,
        }
    }

    fn raw(op: u8, payload: Vec<u8>) -> Vec<u8> {
        let mut out = vec![op];
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn test_v2_create_routes_family_id() {
        let recorder = Arc::new(Recorder::default());
        let mut dispatcher = CrossChainDispatcher::new();
        dispatcher.register(channel_ids::BUCKET, Arc::new(BucketChannel::new(recorder.clone())));

        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(1, 100));
        let ack = dispatcher.execute_syn_package(
            &mut ctx,
            channel_ids::BUCKET,
            &raw(ops::CREATE_V2, v2_package().encode()),
        );

        let created = recorder.created.lock();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].global_virtual_group_family_id, 7);

        // Ack re-wraps the same (V2) op byte and carries the new id
        assert_eq!(ack[0], ops::CREATE_V2);
        let (status, id, extra) = unwrap_ack(&ack[1..]);
        assert_eq!(status, crate::codec::AckStatus::Success);
        assert_eq!(id, Uint::from(42u64));
        assert_eq!(extra, b"relayer-tail");
    }

    #[test]
    fn test_v2_bytes_under_v1_op_never_reach_the_keeper() {
        let recorder = Arc::new(Recorder::default());
        let mut dispatcher = CrossChainDispatcher::new();
        dispatcher.register(channel_ids::BUCKET, Arc::new(BucketChannel::new(recorder.clone())));

        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(1, 100));
        let result = catch_unwind(AssertUnwindSafe(|| {
            dispatcher.execute_syn_package(
                &mut ctx,
                channel_ids::BUCKET,
                &raw(ops::CREATE, v2_package().encode()),
            )
        }));
        assert!(result.is_err());
        assert!(recorder.created.lock().is_empty());
    }

    #[test]
    #[should_panic(expected = "unknown bucket channel syn op")]
    fn test_unknown_op_panics() {
        let mut dispatcher = CrossChainDispatcher::new();
        dispatcher
            .register(channel_ids::BUCKET, Arc::new(BucketChannel::new(Arc::new(Recorder::default()))));
        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(1, 100));
        dispatcher.execute_syn_package(&mut ctx, channel_ids::BUCKET, &[0x7E, 0x00]);
    }

    #[test]
    #[should_panic(expected = "unknown cross-chain channel")]
    fn test_unknown_channel_panics() {
        let dispatcher = CrossChainDispatcher::new();
        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(1, 100));
        dispatcher.execute_syn_package(&mut ctx, 0x55, &[0x01]);
    }

    #[test]
    fn test_handler_error_yields_fail_ack_with_extra() {
        let recorder = Arc::new(Recorder { reject: true, ..Default::default() });
        let mut dispatcher = CrossChainDispatcher::new();
        dispatcher.register(channel_ids::BUCKET, Arc::new(BucketChannel::new(recorder)));

        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(1, 100));
        let ack = dispatcher.execute_syn_package(
            &mut ctx,
            channel_ids::BUCKET,
            &raw(ops::CREATE_V2, v2_package().encode()),
        );
        assert_eq!(ack[0], ops::CREATE_V2);
        let (status, id, extra) = unwrap_ack(&ack[1..]);
        assert_eq!(status, crate::codec::AckStatus::Fail);
        assert_eq!(id, Uint::zero());
        assert_eq!(extra, b"relayer-tail");
    }

    #[test]
    fn test_sbt_mint_and_burn_roundtrip() {
        let mut dispatcher = CrossChainDispatcher::new();
        dispatcher.register(channel_ids::MOCA_SBT, Arc::new(SbtChannel));

        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(1, 100));
        let mint = MintSbtSynPackage {
            to: Address::new([9; 20]),
            token_id: Uint::from(5u64),
            uri: "ipfs://sbt/5".to_string(),
            extra_data: Vec::new(),
        };
        let ack = dispatcher.execute_syn_package(
            &mut ctx,
            channel_ids::MOCA_SBT,
            &raw(0x01, mint.encode()),
        );
        let (status, _, _) = unwrap_ack(&ack[1..]);
        assert_eq!(status, crate::codec::AckStatus::Success);
        assert!(SbtChannel::get(&ctx.store, Uint::from(5u64)).is_some());

        // Double mint fails and rolls back nothing
        let ack = dispatcher.execute_syn_package(
            &mut ctx,
            channel_ids::MOCA_SBT,
            &raw(0x01, mint.encode()),
        );
        let (status, _, _) = unwrap_ack(&ack[1..]);
        assert_eq!(status, crate::codec::AckStatus::Fail);
    }
}
