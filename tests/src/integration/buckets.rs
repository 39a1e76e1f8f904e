//! Bucket caps, approval gating and deletion, block by block.

use crate::fixtures::{chain, chain_with_bucket_cap, OWNER};
use mc_04_storage::domain::invariants;
use mc_04_storage::StorageError;
use shared_store::KvRead;

#[test]
fn bucket_cap_enforced_at_fourth_creation() {
    let mut chain = chain_with_bucket_cap(3);
    for name in ["b1", "b2", "b3"] {
        chain.create_bucket(name);
    }

    // A fresh, valid approval does not help past the cap.
    let msg = chain.bucket_msg("b4", chain.height + 1_000);
    let err = chain.run(|ctx, app| app.storage.create_bucket(ctx, msg).unwrap_err());
    assert_eq!(err, StorageError::MaxBucketLimit { current: 3, limit: 3 });
    let rendered = err.to_string();
    assert!(rendered.contains("max bucket limit"));
    assert!(rendered.contains("3/3"));

    chain.app.query(|store| {
        assert!(invariants::check_bucket_count(store, OWNER, 3));
        assert!(invariants::check_counter_matches_store(store, OWNER));
        assert!(store
            .get(&mc_04_storage::keys::bucket_key("b4"))
            .is_none());
    });
}

#[test]
fn expired_approval_writes_nothing() {
    let mut chain = chain();
    // Advance to height 100, then offer an approval that expired at 95.
    while chain.height < 100 {
        chain.run(|_, _| {});
    }
    let msg = chain.bucket_msg("stale", 95);
    let err = chain.run(|ctx, app| app.storage.create_bucket(ctx, msg).unwrap_err());
    assert!(matches!(
        err,
        StorageError::ApprovalExpired { expired_height: 95, current_height: 100 }
    ));
    chain.app.query(|store| {
        assert!(chain.app.storage.get_bucket(store, "stale").is_none());
        assert!(invariants::check_counter_matches_store(store, OWNER));
    });
}

#[test]
fn delete_requires_empty_bucket() {
    let mut chain = chain();
    chain.create_bucket("bkt");
    chain.create_sealed_object("bkt", "obj", 4_096);

    let err = chain.run(|ctx, app| app.storage.delete_bucket(ctx, OWNER, "bkt").unwrap_err());
    assert_eq!(err, StorageError::BucketNotEmpty { name: "bkt".to_string() });

    chain.run(|ctx, app| app.storage.delete_object(ctx, OWNER, "bkt", "obj").unwrap());
    chain.run(|ctx, app| app.storage.delete_bucket(ctx, OWNER, "bkt").unwrap());
    chain.app.query(|store| {
        assert!(chain.app.storage.get_bucket(store, "bkt").is_none());
    });
}

#[test]
fn charged_read_quota_creates_a_flow() {
    let mut chain = chain();
    let mut msg = chain.bucket_msg("quota-bkt", chain.height + 1_000);
    msg.charged_read_quota = 1_000;
    chain.run(|ctx, app| app.storage.create_bucket(ctx, msg).unwrap());

    chain.app.query(|store| {
        let record = chain.app.payment.get_stream_record(store, OWNER).unwrap();
        // read_price 1 × quota 1000
        assert_eq!(record.netflow_rate, -1_000);
    });
}
