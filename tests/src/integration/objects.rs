//! Object lifecycle: seal → NFT twin, burns on delete, refunds on
//! empty update, forced GC after discontinue.

use crate::fixtures::{chain, OWNER};
use mc_04_storage::ObjectStatus;
use mc_06_evm_precompiles::ObjectNftAdapter;

#[test]
fn seal_mints_twin_and_delete_burns_it() {
    let mut chain = chain();
    chain.create_bucket("bkt");
    let id = chain.create_sealed_object("bkt", "obj", 4_096);

    chain.app.query(|store| {
        assert_eq!(ObjectNftAdapter::owner_of(store, id), Some(OWNER));
    });

    chain.run(|ctx, app| app.storage.delete_object(ctx, OWNER, "bkt", "obj").unwrap());
    chain.app.query(|store| {
        // Exactly one burn happened: the twin is gone and the object too
        assert_eq!(ObjectNftAdapter::owner_of(store, id), None);
        assert!(chain.app.storage.get_object(store, "bkt", "obj").is_none());
    });
}

#[test]
fn empty_object_never_mints() {
    let mut chain = chain();
    chain.create_bucket("bkt");
    let id = chain.create_sealed_object("bkt", "empty", 0);

    chain.app.query(|store| {
        let object = chain.app.storage.get_object(store, "bkt", "empty").unwrap();
        assert_eq!(object.status, ObjectStatus::Sealed);
        assert_eq!(ObjectNftAdapter::owner_of(store, id), None);
    });

    // Deleting it performs zero burn calls; a burn without a twin
    // would fail the delete.
    chain.run(|ctx, app| app.storage.delete_object(ctx, OWNER, "bkt", "empty").unwrap());
    chain.app.query(|store| {
        assert!(chain.app.storage.get_object(store, "bkt", "empty").is_none());
    });
}

#[test]
fn empty_update_refunds_and_zeroes_total_charge() {
    let mut chain = chain();
    chain.create_bucket("bkt");
    chain.create_sealed_object("bkt", "obj", 1_024);

    let bucket_id = chain.app.query(|store| {
        let record = chain.app.payment.get_stream_record(store, OWNER).unwrap();
        assert!(record.netflow_rate < 0);
        chain.app.storage.get_bucket(store, "bkt").unwrap().id
    });

    chain.run(|ctx, app| {
        app.storage
            .update_object_content(ctx, OWNER, "bkt", "obj", 0, Vec::new())
            .unwrap()
    });

    chain.app.query(|store| {
        let internal = chain.app.storage.get_internal_bucket(store, bucket_id).unwrap();
        assert_eq!(internal.total_charge_size, 0);
        // The refund reached the payment engine: no outflow remains
        let record = chain.app.payment.get_stream_record(store, OWNER).unwrap();
        assert_eq!(record.netflow_rate, 0);
        let object = chain.app.storage.get_object(store, "bkt", "obj").unwrap();
        assert_eq!(object.payload_size, 0);
    });
}

#[test]
fn discontinued_object_is_gc_ed_with_one_burn() {
    let mut chain = chain();
    chain.create_bucket("bkt");
    let id = chain.create_sealed_object("bkt", "obj", 4_096);

    let gc = chain.gc_addr;
    chain.run(|ctx, app| {
        app.storage
            .discontinue_objects(ctx, gc, "bkt", &["obj".to_string()])
            .unwrap()
    });
    chain.app.query(|store| {
        let object = chain.app.storage.get_object(store, "bkt", "obj").unwrap();
        assert_eq!(object.status, ObjectStatus::Discontinued);
        // Twin still present through the grace window
        assert_eq!(ObjectNftAdapter::owner_of(store, id), Some(OWNER));
    });

    // The confirm period is 5 blocks; empty blocks roll forward and the
    // end-blocker force-deletes at the scheduled height.
    for _ in 0..6 {
        chain.run(|_, _| {});
    }
    chain.app.query(|store| {
        assert!(chain.app.storage.get_object(store, "bkt", "obj").is_none());
        assert_eq!(ObjectNftAdapter::owner_of(store, id), None);
    });
}
