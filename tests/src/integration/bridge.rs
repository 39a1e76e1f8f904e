//! Cross-chain routing against the wired dispatcher: the V2 create
//! carries the family id into the storage engine, the same inner bytes
//! under the V1 opcode are rejected outright, and acks echo the
//! request's operation byte.

use crate::fixtures::{chain, OWNER};
use mc_05_cross_chain::codec::{unwrap_ack, AckStatus};
use mc_05_cross_chain::packages::{ops, CreateBucketSynPackage, CreateBucketSynPackageV2};
use mc_05_cross_chain::channel_ids;
use shared_types::{Address, SourceType};
use std::panic::{catch_unwind, AssertUnwindSafe};

fn v2_create(chain: &crate::fixtures::Chain, name: &str, family_id: u32) -> Vec<u8> {
    let approval = chain.approval(name.as_bytes(), chain.height + 1_000);
    let package = CreateBucketSynPackageV2 {
        base: CreateBucketSynPackage {
            creator: OWNER,
            bucket_name: name.to_string(),
            payment_address: Address::ZERO,
            primary_sp_address: Address::new([10; 20]),
            expired_height: approval.expired_height,
            approval_sig: approval.sig.to_bytes().to_vec(),
            approval_msg_bytes: name.as_bytes().to_vec(),
            charged_read_quota: 0,
            extra_data: b"relayer".to_vec(),
        },
        global_virtual_group_family_id: family_id,
    };
    let mut raw = vec![ops::CREATE_V2];
    raw.extend_from_slice(&package.encode());
    raw
}

#[test]
fn v2_create_bucket_lands_on_the_bound_family() {
    let mut chain = chain();
    let family_id = chain.family_id;
    let raw = v2_create(&chain, "bridged", family_id);

    let ack = chain.run(|ctx, app| {
        app.dispatcher.execute_syn_package(ctx, channel_ids::BUCKET, &raw)
    });

    assert_eq!(ack[0], ops::CREATE_V2);
    let (status, id, extra) = unwrap_ack(&ack[1..]);
    assert_eq!(status, AckStatus::Success);
    assert_eq!(extra, b"relayer");

    chain.app.query(|store| {
        let bucket = chain.app.storage.get_bucket(store, "bridged").unwrap();
        assert_eq!(bucket.id, id);
        assert_eq!(bucket.gvg_family_id, family_id);
        assert_eq!(bucket.source_type, SourceType::CrossChain);
    });
}

#[test]
fn v2_bytes_under_v1_op_are_rejected_without_effect() {
    let mut chain = chain();
    let family_id = chain.family_id;
    let mut raw = v2_create(&chain, "smuggled", family_id);
    raw[0] = ops::CREATE; // same inner bytes, V1 opcode

    let panicked = chain.run(|ctx, app| {
        catch_unwind(AssertUnwindSafe(|| {
            app.dispatcher.execute_syn_package(ctx, channel_ids::BUCKET, &raw)
        }))
        .is_err()
    });
    assert!(panicked);
    chain.app.query(|store| {
        assert!(chain.app.storage.get_bucket(store, "smuggled").is_none());
    });
}

#[test]
fn failing_create_acks_fail_with_original_extra() {
    let mut chain = chain();
    // Family id that does not exist: the keeper rejects, ack is Fail.
    let raw = v2_create(&chain, "noplace", 9_999);
    let ack = chain.run(|ctx, app| {
        app.dispatcher.execute_syn_package(ctx, channel_ids::BUCKET, &raw)
    });
    assert_eq!(ack[0], ops::CREATE_V2);
    let (status, _, extra) = unwrap_ack(&ack[1..]);
    assert_eq!(status, AckStatus::Fail);
    assert_eq!(extra, b"relayer");
    chain.app.query(|store| {
        assert!(chain.app.storage.get_bucket(store, "noplace").is_none());
    });
}
