//! Wired-node fixtures: an [`node_runtime::App`] with three registered
//! SPs (one primary with known approval/seal/gc keys, two secondaries
//! with BLS keys), a funded owner, one family and one GVG.

use blst::min_pk::{AggregateSignature, SecretKey as BlsSecretKey};
use k256::ecdsa::SigningKey;
use mc_01_payment::PaymentParams;
use mc_02_sp_registry::service::CreateStorageProviderMsg;
use mc_02_sp_registry::Description;
use mc_04_storage::approval::PrimarySpApproval;
use mc_04_storage::service::bucket::CreateBucketMsg;
use mc_04_storage::service::object::{seal_digest, CreateObjectMsg};
use mc_04_storage::StorageParams;
use mc_04_storage::VersionedParams;
use node_runtime::{App, AppConfig, GenesisBuilder};
use shared_crypto::{keccak256, tmhash, BlsPublicKey, BlsSignature, EcdsaSignature, VOTEPOOL_DST};
use shared_store::Context;
use shared_types::{
    module_address, Address, BucketId, FamilyId, ObjectId, SourceType, Visibility,
};

/// Funded bucket owner used across scenarios.
pub const OWNER: Address = Address([0x11; 20]);

/// A wired node plus the keys the scenarios sign with.
pub struct Chain {
    /// The assembled node.
    pub app: App,
    /// SP 1's approval signing key.
    pub approval_key: SigningKey,
    /// SP 1's seal address.
    pub seal_addr: Address,
    /// SP 1's gc address.
    pub gc_addr: Address,
    /// Secondary SPs' BLS keys (SP 2, SP 3).
    pub secondary_bls: Vec<BlsSecretKey>,
    /// The fixture family.
    pub family_id: FamilyId,
    /// Next height to run a block at.
    pub height: u64,
}

/// Derive the Ethereum-style address of a test signing key.
pub fn eth_address(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..32]);
    Address::new(out)
}

fn addr(n: u8) -> Address {
    Address::new([n; 20])
}

/// Build the wired chain with `max_buckets_per_account` applied.
pub fn chain_with_bucket_cap(max_buckets: u64) -> Chain {
    let app = App::new(AppConfig::default()).expect("default config must validate");

    let mut storage_params = StorageParams::default();
    storage_params.max_buckets_per_account = max_buckets;
    storage_params.discontinue_confirm_period = 5;
    let mut payment_params = PaymentParams::default();
    payment_params.reserve_time = 1;
    let mut versioned = VersionedParams::default();
    versioned.min_charge_size = 0;

    GenesisBuilder::new()
        .with_balance(OWNER, u128::MAX / 4, "umoca")
        .with_balance(addr(11), 50_000_000, "umoca")
        .with_balance(addr(21), 50_000_000, "umoca")
        .with_balance(addr(31), 50_000_000, "umoca")
        .with_payment_params(payment_params)
        .with_storage_params(storage_params)
        .with_versioned_params(versioned)
        .apply(&app);

    let approval_key = SigningKey::random(&mut rand::rngs::OsRng);
    let seal_addr = addr(0x13);
    let gc_addr = addr(0x15);
    let mut secondary_bls = Vec::new();
    let authority = module_address("gov");

    let mut chain = Chain {
        app,
        approval_key,
        seal_addr,
        gc_addr,
        secondary_bls: Vec::new(),
        family_id: 0,
        height: 1,
    };

    // Register SP 1 (primary) and SPs 2-3 (secondaries) in one block.
    let approval_addr = eth_address(&chain.approval_key);
    chain.run(|ctx, app| {
        for n in 1u8..=3 {
            let base = n * 10;
            let bls = BlsSecretKey::key_gen(&[n; 32], &[]).unwrap();
            let pk = BlsPublicKey { bytes: bls.sk_to_pk().to_bytes() };
            let proof = BlsSignature {
                bytes: bls.sign(&tmhash(&pk.bytes), VOTEPOOL_DST, &[]).to_bytes(),
            };
            app.sp
                .create_storage_provider(
                    ctx,
                    CreateStorageProviderMsg {
                        creator: authority,
                        operator: addr(base),
                        funding: addr(base + 1),
                        seal: if n == 1 { seal_addr } else { addr(base + 2) },
                        approval: if n == 1 { approval_addr } else { addr(base + 3) },
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
            if n != 1 {
                secondary_bls.push(bls);
            }
        }
        app.sp
            .update_sp_price(
                ctx,
                mc_02_sp_registry::SpPrice {
                    sp_id: 1,
                    update_time: ctx.block.time,
                    read_price: 1,
                    store_price: 100,
                    free_read_quota: 0,
                },
            )
            .unwrap();
        // One GVG under a lazily created family (secondaries SP2, SP3)
        app.vg
            .create_global_virtual_group(ctx, addr(10), 0, vec![2, 3], 1_000_000, "umoca")
            .unwrap();
    });
    chain.secondary_bls = secondary_bls;
    chain.family_id =
        chain.app.query(|store| chain.app.vg.get_gvg(store, 1).unwrap().family_id);
    chain
}

/// Default chain (bucket cap 100).
pub fn chain() -> Chain {
    chain_with_bucket_cap(100)
}

impl Chain {
    /// Run one block with the given deliveries; advances the height.
    pub fn run<R>(&mut self, deliver: impl FnOnce(&mut Context<'_>, &App) -> R) -> R {
        let height = self.height;
        self.height += 1;
        let app = &self.app;
        app.run_block(height, height as i64 * 10, |ctx| deliver(ctx, app))
    }

    /// A valid approval from SP 1 over `msg_bytes`.
    pub fn approval(&self, msg_bytes: &[u8], expired_height: u64) -> PrimarySpApproval {
        let digest = keccak256(msg_bytes);
        let (sig, recid) = self.approval_key.sign_prehash_recoverable(&digest).unwrap();
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

    /// CreateBucket message for the fixture owner.
    pub fn bucket_msg(&self, name: &str, expired_height: u64) -> CreateBucketMsg {
        CreateBucketMsg {
            creator: OWNER,
            bucket_name: name.to_string(),
            visibility: Visibility::Private,
            payment_address: Address::ZERO,
            primary_sp_address: addr(10),
            primary_sp_approval: Some(self.approval(name.as_bytes(), expired_height)),
            approval_msg_bytes: Some(name.as_bytes().to_vec()),
            charged_read_quota: 0,
            source_type: SourceType::Origin,
        }
    }

    /// Create a bucket in its own block.
    pub fn create_bucket(&mut self, name: &str) -> BucketId {
        let msg = self.bucket_msg(name, self.height + 1_000);
        self.run(|ctx, app| app.storage.create_bucket(ctx, msg).unwrap())
    }

    /// Create (and for non-empty payloads, seal) an object in one block.
    pub fn create_sealed_object(
        &mut self,
        bucket_name: &str,
        object_name: &str,
        payload: u64,
    ) -> ObjectId {
        let seal_addr = self.seal_addr;
        let secondary_bls = self.secondary_bls.clone();
        let bucket = bucket_name.to_string();
        let object = object_name.to_string();
        self.run(move |ctx, app| {
            let id = app
                .storage
                .create_object(
                    ctx,
                    CreateObjectMsg {
                        operator: OWNER,
                        bucket_name: bucket.clone(),
                        object_name: object.clone(),
                        payload_size: payload,
                        checksums: vec![[0xCC; 32]],
                        visibility: Visibility::Private,
                        source_type: SourceType::Origin,
                    },
                )
                .unwrap();
            if payload > 0 {
                let bucket_info = app.storage.get_bucket(&ctx.store, &bucket).unwrap();
                let object_info = app.storage.get_object(&ctx.store, &bucket, &object).unwrap();
                let digest = seal_digest(&bucket_info, &object_info);
                let sigs: Vec<blst::min_pk::Signature> = secondary_bls
                    .iter()
                    .map(|sk| sk.sign(&digest, VOTEPOOL_DST, &[]))
                    .collect();
                let refs: Vec<&blst::min_pk::Signature> = sigs.iter().collect();
                let agg = AggregateSignature::aggregate(&refs, true).unwrap();
                let sig = BlsSignature { bytes: agg.to_signature().to_bytes() };
                app.storage.seal_object(ctx, seal_addr, &bucket, &object, &sig).unwrap();
            }
            id
        })
    }
}
