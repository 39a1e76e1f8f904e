//! # SP Approvals
//!
//! Bucket creation and cross-bucket copies are gated by an approval the
//! primary SP signs off-chain: an ECDSA signature over
//! `keccak256(approval_msg_bytes)` by the SP's approval address, bound
//! to an expiry height and optionally a family id.

use crate::domain::errors::StorageError;
use mc_02_sp_registry::StorageProvider;
use shared_crypto::{keccak256, verify_signer, EcdsaSignature};
use shared_store::Context;
use shared_types::FamilyId;

/// An SP's signed authorization for a bucket operation.
#[derive(Clone, Debug)]
pub struct PrimarySpApproval {
    /// Block height the approval lapses at.
    pub expired_height: u64,
    /// Family the SP routes the bucket to (0 lets the engine pick).
    pub global_virtual_group_family_id: FamilyId,
    /// Signature over `keccak256(approval_msg_bytes)`.
    pub sig: EcdsaSignature,
}

/// Verify the three approval preconditions shared by CreateBucket and
/// CopyObject, in order: presence, expiry, signature.
pub fn check_approval(
    ctx: &Context<'_>,
    sp: &StorageProvider,
    approval: Option<&PrimarySpApproval>,
    approval_msg_bytes: Option<&[u8]>,
) -> Result<PrimarySpApproval, StorageError> {
    let (approval, msg_bytes) = match (approval, approval_msg_bytes) {
        (Some(approval), Some(bytes)) => (approval, bytes),
        _ => return Err(StorageError::MissingApproval),
    };
    if approval.expired_height <= ctx.block.height {
        return Err(StorageError::ApprovalExpired {
            expired_height: approval.expired_height,
            current_height: ctx.block.height,
        });
    }
    let digest = keccak256(msg_bytes);
    verify_signer(&digest, &approval.sig, sp.approval)
        .map_err(|_| StorageError::InvalidApproval)?;
    Ok(approval.clone())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use mc_02_sp_registry::{Description, SpStatus};
    use shared_crypto::BlsPublicKey;
    use shared_store::MemStore;
    use shared_types::{Address, BlockContext};

    fn sp_with_approval(key: &SigningKey) -> StorageProvider {
        let point = key.verifying_key().to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut approval = [0u8; 20];
        approval.copy_from_slice(&hash[12..32]);
        StorageProvider {
            id: 1,
            operator: Address::new([1; 20]),
            funding: Address::new([2; 20]),
            seal: Address::new([3; 20]),
            approval: Address::new(approval),
            gc: Address::new([5; 20]),
            maintenance: Address::new([6; 20]),
            bls_pubkey: BlsPublicKey { bytes: [0xAA; 48] },
            deposit: 0,
            status: SpStatus::InService,
            endpoint: "https://sp.example.com".to_string(),
            description: Description::default(),
        }
    }

    fn sign(key: &SigningKey, msg: &[u8], expired_height: u64) -> PrimarySpApproval {
        let digest = keccak256(msg);
        let (sig, recid) = key.sign_prehash_recoverable(&digest).unwrap();
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

    #[test]
    fn test_approval_preconditions_in_order() {
        let key = SigningKey::random(&mut rand::rngs::OsRng);
        let sp = sp_with_approval(&key);
        let store = MemStore::new();
        let ctx = Context::new(&store, BlockContext::new(100, 1000));

        // 1. Missing approval
        assert_eq!(
            check_approval(&ctx, &sp, None, Some(b"msg")).unwrap_err(),
            StorageError::MissingApproval
        );
        // 2. Expired at height 95 < 100
        let stale = sign(&key, b"msg", 95);
        assert!(matches!(
            check_approval(&ctx, &sp, Some(&stale), Some(b"msg")).unwrap_err(),
            StorageError::ApprovalExpired { expired_height: 95, current_height: 100 }
        ));
        // 3. Signature over different bytes
        let wrong = sign(&key, b"other", 200);
        assert_eq!(
            check_approval(&ctx, &sp, Some(&wrong), Some(b"msg")).unwrap_err(),
            StorageError::InvalidApproval
        );
        // Valid approval passes
        let good = sign(&key, b"msg", 200);
        assert!(check_approval(&ctx, &sp, Some(&good), Some(b"msg")).is_ok());
    }
}
