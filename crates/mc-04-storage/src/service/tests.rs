//! Storage service tests over a full SP + virtual-group + payment
//! fixture, including the NFT-twin rules and the forced GC pass.

use super::bucket::CreateBucketMsg;
use super::object::{seal_digest, CreateObjectMsg};
use super::StorageService;
use crate::approval::PrimarySpApproval;
use crate::domain::errors::StorageError;
use crate::domain::invariants;
use crate::domain::value_objects::ObjectStatus;
use crate::keys;
use crate::ports::{NftError, ObjectNftApi};
use blst::min_pk::{AggregateSignature, SecretKey as BlsSecretKey};
use k256::ecdsa::SigningKey;
use mc_01_payment::{PaymentParams, PaymentService};
use mc_02_sp_registry::service::CreateStorageProviderMsg;
use mc_02_sp_registry::{Description, SpPrice, SpService};
use mc_03_virtual_group::VirtualGroupService;
use shared_crypto::{keccak256, tmhash, BlsPublicKey, BlsSignature, EcdsaSignature, VOTEPOOL_DST};
use shared_store::bank::{BankApi, BankStore};
use shared_store::kv::namespaces;
use shared_store::{Context, KvRead, KvWrite, MemStore};
use shared_types::{Address, BlockContext, Coin, ObjectId, SourceType, Uint, Visibility};
use std::sync::Arc;

// -----------------------------------------------------------------------------
// NFT adapter backed by the message's own cache context, so rollback
// semantics hold in tests exactly as they do in the EVM adapter.
// -----------------------------------------------------------------------------

struct StoreNft;

fn twin_key(object_id: ObjectId) -> Vec<u8> {
    let mut key = vec![namespaces::EVM, 0x01];
    let mut id = [0u8; 32];
    object_id.to_big_endian(&mut id);
    key.extend_from_slice(&id);
    key
}

impl ObjectNftApi for StoreNft {
    fn mint(&self, ctx: &mut Context<'_>, object_id: ObjectId, owner: Address) -> Result<(), NftError> {
        let key = twin_key(object_id);
        if ctx.store.has(&key) {
            return Err("twin already minted".to_string());
        }
        ctx.store.set(key, owner.as_bytes().to_vec());
        Ok(())
    }

    fn burn(&self, ctx: &mut Context<'_>, object_id: ObjectId) -> Result<(), NftError> {
        let key = twin_key(object_id);
        if !ctx.store.has(&key) {
            return Err("no twin to burn".to_string());
        }
        ctx.store.delete(&key);
        Ok(())
    }

    fn exists(&self, ctx: &Context<'_>, object_id: ObjectId) -> bool {
        ctx.store.has(&twin_key(object_id))
    }
}

/// Burn always fails; mint delegates. Used to assert delete atomicity.
struct FailingBurnNft;

impl ObjectNftApi for FailingBurnNft {
    fn mint(&self, ctx: &mut Context<'_>, object_id: ObjectId, owner: Address) -> Result<(), NftError> {
        StoreNft.mint(ctx, object_id, owner)
    }

    fn burn(&self, _ctx: &mut Context<'_>, _object_id: ObjectId) -> Result<(), NftError> {
        Err("evm revert".to_string())
    }

    fn exists(&self, ctx: &Context<'_>, object_id: ObjectId) -> bool {
        StoreNft.exists(ctx, object_id)
    }
}

// -----------------------------------------------------------------------------
// Fixture
// -----------------------------------------------------------------------------

const OWNER: Address = Address([0x11; 20]);

struct Fx {
    storage: Arc<StorageService>,
    payment: Arc<PaymentService>,
    store: MemStore,
    approval_key: SigningKey,
    seal_addr: Address,
    gc_addr: Address,
    secondary_bls: Vec<BlsSecretKey>,
}

fn addr(n: u8) -> Address {
    Address::new([n; 20])
}

fn eth_address(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..32]);
    Address::new(out)
}

fn commit(base: &mut MemStore, writes: Vec<(Vec<u8>, Option<Vec<u8>>)>) {
    shared_store::cache::apply_writes(base, writes);
}

fn fixture_with_nft(nft: Arc<dyn ObjectNftApi>) -> Fx {
    let bank = Arc::new(BankStore);
    let sp_svc = Arc::new(SpService::new(bank.clone(), addr(0xEE)));
    let payment = Arc::new(PaymentService::new(bank.clone()));
    let vg = Arc::new(VirtualGroupService::new(bank.clone(), payment.clone(), sp_svc.clone()));
    let storage = Arc::new(StorageService::new(payment.clone(), sp_svc.clone(), vg.clone(), nft));
    vg.set_storage_api(storage.clone());

    let mut store = MemStore::new();
    BankStore.mint(&mut store, OWNER, &Coin::new("umoca", Uint::from(u128::MAX / 4)));

    let approval_key = SigningKey::random(&mut rand::rngs::OsRng);
    let seal_addr = addr(0x13);
    let gc_addr = addr(0x15);
    let mut secondary_bls = Vec::new();

    for n in 1u8..=3 {
        let base = n * 10;
        BankStore.mint(&mut store, addr(base + 1), &Coin::new("umoca", Uint::from(50_000_000u64)));
        let bls = BlsSecretKey::key_gen(&[n; 32], &[]).unwrap();
        let pk = BlsPublicKey { bytes: bls.sk_to_pk().to_bytes() };
        let proof =
            BlsSignature { bytes: bls.sign(&tmhash(&pk.bytes), VOTEPOOL_DST, &[]).to_bytes() };
        let mut ctx = Context::new(&store, BlockContext::new(1, 50));
        sp_svc
            .create_storage_provider(
                &mut ctx,
                CreateStorageProviderMsg {
                    creator: addr(0xEE),
                    operator: addr(base),
                    funding: addr(base + 1),
                    seal: if n == 1 { seal_addr } else { addr(base + 2) },
                    approval: if n == 1 {
                        eth_address(&approval_key)
                    } else {
                        addr(base + 3)
                    },
                    gc: if n == 1 { gc_addr } else { addr(base + 4) },
                    maintenance: addr(base + 5),
                    bls_pubkey: pk,
                    bls_proof: proof,
                    endpoint: "https://sp.example.com".to_string(),
                    deposit: 2_000_000,
                    description: Description::default(),
                },
            )
            .unwrap();
        let writes = ctx.store.into_writes();
        commit(&mut store, writes);
        if n != 1 {
            secondary_bls.push(bls);
        }
    }

    let mut ctx = Context::new(&store, BlockContext::new(1, 50));
    // Short reserve so buffers stay small in tests
    let mut payment_params = PaymentParams::default();
    payment_params.reserve_time = 1;
    payment.set_params(&mut ctx.store, &payment_params);
    // Prices: read 1, store 100 → secondary 12 (12% ratio)
    sp_svc
        .update_sp_price(
            &mut ctx,
            SpPrice { sp_id: 1, update_time: 50, read_price: 1, store_price: 100, free_read_quota: 0 },
        )
        .unwrap();
    // Charge exactly the payload
    let mut versioned = crate::domain::entities::VersionedParams::default();
    versioned.min_charge_size = 0;
    storage.append_versioned_params(&mut ctx.store, &versioned);
    // One GVG under a lazily created family, secondaries SP2 + SP3
    vg.create_global_virtual_group(&mut ctx, addr(10), 0, vec![2, 3], 1_000_000, "umoca")
        .unwrap();
    let writes = ctx.store.into_writes();
    commit(&mut store, writes);

    Fx { storage, payment, store, approval_key, seal_addr, gc_addr, secondary_bls }
}

fn fixture() -> Fx {
    fixture_with_nft(Arc::new(StoreNft))
}

fn approval(fx: &Fx, msg_bytes: &[u8], expired_height: u64) -> PrimarySpApproval {
    let digest = keccak256(msg_bytes);
    let (sig, recid) = fx.approval_key.sign_prehash_recoverable(&digest).unwrap();
    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[0..32]);
    s.copy_from_slice(&bytes[32..64]);
    PrimarySpApproval {
        expired_height,
        global_virtual_group_family_id: 0,
        sig: EcdsaSignature { r, s, v: recid.to_byte() },
    }
}

fn bucket_msg(fx: &Fx, name: &str, expired_height: u64) -> CreateBucketMsg {
    CreateBucketMsg {
        creator: OWNER,
        bucket_name: name.to_string(),
        visibility: Visibility::Private,
        payment_address: Address::ZERO,
        primary_sp_address: addr(10),
        primary_sp_approval: Some(approval(fx, name.as_bytes(), expired_height)),
        approval_msg_bytes: Some(name.as_bytes().to_vec()),
        charged_read_quota: 0,
        source_type: SourceType::Origin,
    }
}

fn seal_sig(fx: &Fx, ctx: &Context<'_>, bucket_name: &str, object_name: &str) -> BlsSignature {
    let bucket = fx.storage.get_bucket(&ctx.store, bucket_name).unwrap();
    let object = fx.storage.get_object(&ctx.store, bucket_name, object_name).unwrap();
    let digest = seal_digest(&bucket, &object);
    let sigs: Vec<blst::min_pk::Signature> = fx
        .secondary_bls
        .iter()
        .map(|sk| sk.sign(&digest, VOTEPOOL_DST, &[]))
        .collect();
    let refs: Vec<&blst::min_pk::Signature> = sigs.iter().collect();
    let agg = AggregateSignature::aggregate(&refs, true).unwrap();
    BlsSignature { bytes: agg.to_signature().to_bytes() }
}

fn create_sealed_object(
    fx: &Fx,
    ctx: &mut Context<'_>,
    bucket_name: &str,
    object_name: &str,
    payload: u64,
) -> ObjectId {
    let id = fx
        .storage
        .create_object(
            ctx,
            CreateObjectMsg {
                operator: OWNER,
                bucket_name: bucket_name.to_string(),
                object_name: object_name.to_string(),
                payload_size: payload,
                checksums: vec![[0xCC; 32]],
                visibility: Visibility::Private,
                source_type: SourceType::Origin,
            },
        )
        .unwrap();
    if payload > 0 {
        let sig = seal_sig(fx, ctx, bucket_name, object_name);
        fx.storage.seal_object(ctx, fx.seal_addr, bucket_name, object_name, &sig).unwrap();
    }
    id
}

// -----------------------------------------------------------------------------
// Bucket scenarios
// -----------------------------------------------------------------------------

#[test]
fn test_bucket_cap_three_then_fail() {
    let fx = fixture();
    let mut ctx = Context::new(&fx.store, BlockContext::new(10, 100));
    let mut params = fx.storage.get_params(&ctx.store);
    params.max_buckets_per_account = 3;
    fx.storage.set_params(&mut ctx.store, &params);

    for name in ["b1", "b2", "b3"] {
        fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, name, 1000)).unwrap();
    }
    let err = fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "b4", 1000)).unwrap_err();
    assert_eq!(err, StorageError::MaxBucketLimit { current: 3, limit: 3 });
    let rendered = err.to_string();
    assert!(rendered.contains("max bucket limit"));
    assert!(rendered.contains("3/3"));

    let count: u64 =
        shared_store::kv::get_obj(&ctx.store, &keys::bucket_count_key(OWNER)).unwrap();
    assert_eq!(count, 3);
    assert!(invariants::check_bucket_count(&ctx.store, OWNER, 3));
    assert!(invariants::check_counter_matches_store(&ctx.store, OWNER));
}

#[test]
fn test_expired_approval_rejected() {
    let fx = fixture();
    let mut ctx = Context::new(&fx.store, BlockContext::new(100, 1000));

    let err = fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "stale", 95)).unwrap_err();
    assert!(matches!(err, StorageError::ApprovalExpired { expired_height: 95, current_height: 100 }));
    assert!(fx.storage.get_bucket(&ctx.store, "stale").is_none());
    let count: u64 =
        shared_store::kv::get_obj(&ctx.store, &keys::bucket_count_key(OWNER)).unwrap_or(0);
    assert_eq!(count, 0);
}

#[test]
fn test_missing_approval_rejected() {
    let fx = fixture();
    let mut ctx = Context::new(&fx.store, BlockContext::new(10, 100));
    let mut msg = bucket_msg(&fx, "no-approval", 1000);
    msg.primary_sp_approval = None;
    assert_eq!(
        fx.storage.create_bucket(&mut ctx, msg).unwrap_err(),
        StorageError::MissingApproval
    );
}

#[test]
fn test_delete_bucket_requires_empty() {
    let fx = fixture();
    let mut ctx = Context::new(&fx.store, BlockContext::new(10, 100));
    fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "bkt", 1000)).unwrap();
    create_sealed_object(&fx, &mut ctx, "bkt", "obj", 1024);

    let err = fx.storage.delete_bucket(&mut ctx, OWNER, "bkt").unwrap_err();
    assert_eq!(err, StorageError::BucketNotEmpty { name: "bkt".to_string() });

    fx.storage.delete_object(&mut ctx, OWNER, "bkt", "obj").unwrap();
    fx.storage.delete_bucket(&mut ctx, OWNER, "bkt").unwrap();
    assert!(fx.storage.get_bucket(&ctx.store, "bkt").is_none());
    assert!(invariants::check_counter_matches_store(&ctx.store, OWNER));
}

// -----------------------------------------------------------------------------
// Object / NFT-twin scenarios
// -----------------------------------------------------------------------------

#[test]
fn test_seal_mints_and_delete_burns() {
    let fx = fixture();
    let mut ctx = Context::new(&fx.store, BlockContext::new(10, 100));
    fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "bkt", 1000)).unwrap();

    let id = create_sealed_object(&fx, &mut ctx, "bkt", "obj", 1024);
    assert!(StoreNft.exists(&ctx, id));
    let object = fx.storage.get_object(&ctx.store, "bkt", "obj").unwrap();
    assert_eq!(object.status, ObjectStatus::Sealed);

    fx.storage.delete_object(&mut ctx, OWNER, "bkt", "obj").unwrap();
    assert!(!StoreNft.exists(&ctx, id));
    assert!(fx.storage.get_object(&ctx.store, "bkt", "obj").is_none());
}

#[test]
fn test_empty_object_seals_without_minting() {
    let fx = fixture();
    let mut ctx = Context::new(&fx.store, BlockContext::new(10, 100));
    fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "bkt", 1000)).unwrap();

    let id = create_sealed_object(&fx, &mut ctx, "bkt", "empty", 0);
    let object = fx.storage.get_object(&ctx.store, "bkt", "empty").unwrap();
    assert_eq!(object.status, ObjectStatus::Sealed);
    assert!(!StoreNft.exists(&ctx, id));

    // Deleting the empty sealed object must not attempt a burn: the
    // store-backed adapter would error on a burn without a twin.
    fx.storage.delete_object(&mut ctx, OWNER, "bkt", "empty").unwrap();
}

#[test]
fn test_bad_seal_signature_rejected() {
    let fx = fixture();
    let mut ctx = Context::new(&fx.store, BlockContext::new(10, 100));
    fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "bkt", 1000)).unwrap();
    fx.storage
        .create_object(
            &mut ctx,
            CreateObjectMsg {
                operator: OWNER,
                bucket_name: "bkt".to_string(),
                object_name: "obj".to_string(),
                payload_size: 1024,
                checksums: vec![[0xCC; 32]],
                visibility: Visibility::Private,
                source_type: SourceType::Origin,
            },
        )
        .unwrap();

    // Only one secondary signs: the aggregate over both keys must fail
    let bucket = fx.storage.get_bucket(&ctx.store, "bkt").unwrap();
    let object = fx.storage.get_object(&ctx.store, "bkt", "obj").unwrap();
    let digest = seal_digest(&bucket, &object);
    let partial = BlsSignature {
        bytes: fx.secondary_bls[0].sign(&digest, VOTEPOOL_DST, &[]).to_bytes(),
    };
    let err = fx
        .storage
        .seal_object(&mut ctx, fx.seal_addr, "bkt", "obj", &partial)
        .unwrap_err();
    assert_eq!(err, StorageError::InvalidSealSignature);
}

#[test]
fn test_burn_failure_aborts_delete_atomically() {
    let fx = fixture_with_nft(Arc::new(FailingBurnNft));
    let mut ctx = Context::new(&fx.store, BlockContext::new(10, 100));
    fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "bkt", 1000)).unwrap();
    create_sealed_object(&fx, &mut ctx, "bkt", "obj", 1024);

    let result: Result<(), StorageError> =
        ctx.run_scoped(|child| fx.storage.delete_object(child, OWNER, "bkt", "obj"));
    assert!(matches!(result, Err(StorageError::NftCallFailed { .. })));
    // The rolled-back scope left the object and its charge untouched
    let object = fx.storage.get_object(&ctx.store, "bkt", "obj").unwrap();
    assert_eq!(object.status, ObjectStatus::Sealed);
    let bucket = fx.storage.get_bucket(&ctx.store, "bkt").unwrap();
    let internal = fx.storage.get_internal_bucket(&ctx.store, bucket.id).unwrap();
    assert_eq!(internal.total_charge_size, 1024);
}

#[test]
fn test_empty_update_refunds_and_zeroes_charge() {
    let fx = fixture();
    let mut ctx = Context::new(&fx.store, BlockContext::new(10, 100));
    fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "bkt", 1000)).unwrap();
    create_sealed_object(&fx, &mut ctx, "bkt", "obj", 1024);

    let bucket = fx.storage.get_bucket(&ctx.store, "bkt").unwrap();
    let charged = fx.payment.get_stream_record(&ctx.store, OWNER).unwrap();
    assert!(charged.netflow_rate < 0);

    fx.storage
        .update_object_content(&mut ctx, OWNER, "bkt", "obj", 0, Vec::new())
        .unwrap();

    let internal = fx.storage.get_internal_bucket(&ctx.store, bucket.id).unwrap();
    assert_eq!(internal.total_charge_size, 0);
    assert!(invariants::check_charge_size_consistency(&internal));
    // Refund applied: no outflow remains
    let refunded = fx.payment.get_stream_record(&ctx.store, OWNER).unwrap();
    assert_eq!(refunded.netflow_rate, 0);
    let object = fx.storage.get_object(&ctx.store, "bkt", "obj").unwrap();
    assert_eq!(object.payload_size, 0);
}

// -----------------------------------------------------------------------------
// Discontinue / GC
// -----------------------------------------------------------------------------

#[test]
fn test_discontinue_object_then_forced_gc_burns_once() {
    let fx = fixture();
    let mut base = fx.store.clone();
    let mut ctx = Context::new(&base, BlockContext::new(10, 100));
    fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "bkt", 1000)).unwrap();
    let id = create_sealed_object(&fx, &mut ctx, "bkt", "obj", 1024);
    fx.storage
        .discontinue_objects(&mut ctx, fx.gc_addr, "bkt", &["obj".to_string()])
        .unwrap();
    let object = fx.storage.get_object(&ctx.store, "bkt", "obj").unwrap();
    assert_eq!(object.status, ObjectStatus::Discontinued);
    let writes = ctx.store.into_writes();
    commit(&mut base, writes);

    // Before the confirm period: nothing happens (period default is 5)
    let mut ctx = Context::new(&base, BlockContext::new(12, 120));
    fx.storage.end_blocker(&mut ctx);
    assert!(fx.storage.get_object(&ctx.store, "bkt", "obj").is_some());
    drop(ctx);

    // At the scheduled height the twin burns (original status SEALED)
    let mut ctx = Context::new(&base, BlockContext::new(15, 150));
    fx.storage.end_blocker(&mut ctx);
    assert!(fx.storage.get_object(&ctx.store, "bkt", "obj").is_none());
    assert!(!StoreNft.exists(&ctx, id));
}

#[test]
fn test_discontinue_rate_limit() {
    let fx = fixture();
    let mut ctx = Context::new(&fx.store, BlockContext::new(10, 100));
    let mut params = fx.storage.get_params(&ctx.store);
    params.discontinue_object_max = 1;
    fx.storage.set_params(&mut ctx.store, &params);
    fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "bkt", 1000)).unwrap();
    create_sealed_object(&fx, &mut ctx, "bkt", "o1", 1024);
    create_sealed_object(&fx, &mut ctx, "bkt", "o2", 1024);

    fx.storage
        .discontinue_objects(&mut ctx, fx.gc_addr, "bkt", &["o1".to_string()])
        .unwrap();
    let err = fx
        .storage
        .discontinue_objects(&mut ctx, fx.gc_addr, "bkt", &["o2".to_string()])
        .unwrap_err();
    assert_eq!(err, StorageError::DiscontinueLimit { requested: 1, remaining: 0 });
}

// -----------------------------------------------------------------------------
// Policies through the service
// -----------------------------------------------------------------------------

#[test]
fn test_policy_grants_delete_and_gc_expires() {
    use crate::domain::entities::Statement;
    use crate::domain::value_objects::{ActionType, Effect, Principal, Resource, ResourceType};

    let fx = fixture();
    let mut ctx = Context::new(&fx.store, BlockContext::new(10, 100));
    fx.storage.create_bucket(&mut ctx, bucket_msg(&fx, "bkt", 1000)).unwrap();
    let object_id = create_sealed_object(&fx, &mut ctx, "bkt", "obj", 1024);
    let friend = addr(0x42);

    // Without a policy the friend is denied
    let err = fx.storage.delete_object(&mut ctx, friend, "bkt", "obj").unwrap_err();
    assert_eq!(err, StorageError::AccessDenied { operator: friend });

    fx.storage
        .put_policy(
            &mut ctx,
            OWNER,
            Principal::Account(friend),
            Resource { resource_type: ResourceType::Object, resource_id: object_id },
            vec![Statement {
                actions: vec![ActionType::DeleteObject],
                effect: Effect::Allow,
                expiration_time: None,
            }],
            Some(500),
        )
        .unwrap();
    fx.storage.delete_object(&mut ctx, friend, "bkt", "obj").unwrap();

    // A second expiring policy on the bucket gets GC'd once stale
    let bucket = fx.storage.get_bucket(&ctx.store, "bkt").unwrap();
    let id = fx
        .storage
        .put_policy(
            &mut ctx,
            OWNER,
            Principal::Account(friend),
            Resource { resource_type: ResourceType::Bucket, resource_id: bucket.id },
            vec![Statement {
                actions: vec![ActionType::CreateObject],
                effect: Effect::Allow,
                expiration_time: None,
            }],
            Some(150),
        )
        .unwrap();
    assert!(shared_store::kv::get_obj::<crate::domain::entities::Policy>(
        &ctx.store,
        &keys::policy_key(id)
    )
    .is_some());

    let mut base = fx.store.clone();
    let writes = ctx.store.into_writes();
    commit(&mut base, writes);
    let mut ctx = Context::new(&base, BlockContext::new(20, 200));
    fx.storage.end_blocker(&mut ctx);
    assert!(shared_store::kv::get_obj::<crate::domain::entities::Policy>(
        &ctx.store,
        &keys::policy_key(id)
    )
    .is_none());
}
