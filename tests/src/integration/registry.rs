//! SP registry and settlement flows over committed blocks.

use crate::fixtures::chain;
use k256::ecdsa::SigningKey;
use mc_02_sp_registry::service::EditStorageProviderMsg;
use mc_02_sp_registry::SpError;
use shared_store::bank::BankApi;
use shared_types::{Address, Uint};

fn addr(n: u8) -> Address {
    Address::new([n; 20])
}

#[test]
fn slash_removal_keeps_other_sp_records() {
    let mut chain = chain();
    let object = Uint::from(12_345u64);
    chain.run(|ctx, app| {
        app.sp.save_slash(&mut ctx.store, 1, object, 50);
        app.sp.save_slash(&mut ctx.store, 2, object, 80);
    });
    chain.app.query(|store| {
        assert!(chain.app.sp.has_slash(store, 1, object));
        assert!(chain.app.sp.has_slash(store, 2, object));
    });

    chain.run(|ctx, app| app.sp.remove_slash_until(&mut ctx.store, 50));
    chain.app.query(|store| {
        assert!(!chain.app.sp.has_slash(store, 1, object));
        assert!(chain.app.sp.has_slash(store, 2, object));
    });
}

#[test]
fn seal_address_freed_by_edit_is_claimable() {
    let mut chain = chain();
    let old_seal = chain.seal_addr;

    chain.run(|ctx, app| {
        app.sp
            .edit_storage_provider(
                ctx,
                EditStorageProviderMsg {
                    operator: addr(10),
                    seal: Some(addr(0x77)),
                    ..Default::default()
                },
            )
            .unwrap();
        // The freed value is immediately claimable by another SP
        app.sp
            .edit_storage_provider(
                ctx,
                EditStorageProviderMsg {
                    operator: addr(20),
                    seal: Some(old_seal),
                    ..Default::default()
                },
            )
            .unwrap();
    });
    chain.app.query(|store| {
        assert_eq!(chain.app.sp.get_sp_by_operator(store, addr(20)).unwrap().seal, old_seal);
    });
}

#[test]
fn no_op_edit_is_rejected() {
    let mut chain = chain();
    let err = chain.run(|ctx, app| {
        app.sp
            .edit_storage_provider(
                ctx,
                EditStorageProviderMsg { operator: addr(10), ..Default::default() },
            )
            .unwrap_err()
    });
    assert_eq!(err, SpError::StorageProviderNotChanged);
}

#[test]
fn family_settlement_pays_the_primary() {
    let mut chain = chain();
    chain.create_bucket("bkt");
    chain.create_sealed_object("bkt", "obj", 100_000);

    // Let fees accrue for a few blocks, then settle the family.
    for _ in 0..5 {
        chain.run(|_, _| {});
    }
    let family_id = chain.family_id;
    let before = chain
        .app
        .query(|store| chain.app.bank.balance_of(store, addr(11), "umoca"));
    let settled = chain.run(|ctx, app| app.vg.settle_family(ctx, family_id).unwrap());
    assert!(settled > 0);
    let after = chain
        .app
        .query(|store| chain.app.bank.balance_of(store, addr(11), "umoca"));
    assert_eq!(after, before + Uint::from(settled));
}

#[test]
fn rogue_swap_approval_is_rejected() {
    use mc_03_virtual_group::service::{swap_approval_digest, SuccessorApproval};
    use shared_crypto::EcdsaSignature;

    let mut chain = chain();
    let family_id = chain.family_id;
    // A key that is NOT SP2's approval key signs: invalid signature.
    let rogue = SigningKey::random(&mut rand::rngs::OsRng);
    let digest = swap_approval_digest(1, family_id, chain.height + 10);
    let (sig, recid) = rogue.sign_prehash_recoverable(&digest).unwrap();
    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[0..32]);
    s.copy_from_slice(&bytes[32..64]);
    let approval = SuccessorApproval {
        expired_height: chain.height + 10,
        sig: EcdsaSignature { r, s, v: recid.to_byte() },
    };

    let err = chain.run(|ctx, app| {
        app.vg
            .swap_out(ctx, addr(10), family_id, &[1], 2, &approval)
            .unwrap_err()
    });
    assert_eq!(err, mc_03_virtual_group::VgError::InvalidApproval);

    // The group is untouched by the failed reservation.
    chain.app.query(|store| {
        assert_eq!(chain.app.vg.get_gvg(store, 1).unwrap().primary_sp_id, 1);
    });
}
