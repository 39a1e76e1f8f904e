//! # SP Entities

use super::value_objects::SpStatus;
use serde::{Deserialize, Serialize};
use shared_crypto::BlsPublicKey;
use shared_types::{Address, Denom, SpId};

/// Operator-facing metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Description {
    /// Display name.
    pub moniker: String,
    /// Identity string (keybase etc.).
    pub identity: String,
    /// Free-form details.
    pub details: String,
}

/// A registered storage provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProvider {
    /// Registry id.
    pub id: SpId,
    /// Transaction-signing operator address.
    pub operator: Address,
    /// Deposit funding address.
    pub funding: Address,
    /// Seal-signing address.
    pub seal: Address,
    /// Approval-signing address.
    pub approval: Address,
    /// Garbage-collection address.
    pub gc: Address,
    /// Maintenance address (not uniqueness-indexed).
    pub maintenance: Address,
    /// BLS public key used in seal aggregation.
    pub bls_pubkey: BlsPublicKey,
    /// Escrowed deposit.
    pub deposit: u128,
    /// Lifecycle status.
    pub status: SpStatus,
    /// Service endpoint URL.
    pub endpoint: String,
    /// Operator metadata.
    pub description: Description,
}

/// Per-SP prices, versioned by update time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpPrice {
    /// Owning SP.
    pub sp_id: SpId,
    /// Unix seconds the price took effect.
    pub update_time: i64,
    /// Read price per byte-second.
    pub read_price: u128,
    /// Store price per byte-second.
    pub store_price: u128,
    /// Free read quota in bytes.
    pub free_read_quota: u64,
}

/// Network-wide price snapshot derived from all SP prices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSpStorePrice {
    /// Unix seconds the snapshot took effect.
    pub update_time: i64,
    /// Primary SP store price per byte-second.
    pub primary_store_price: u128,
    /// Secondary SP store price per byte-second.
    pub secondary_store_price: u128,
    /// Read price per byte-second.
    pub read_price: u128,
}

/// Governance parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpParams {
    /// Minimum deposit to register.
    pub min_deposit: u128,
    /// Deposit denomination.
    pub deposit_denom: Denom,
    /// Numerator of the secondary/primary store price ratio (percent).
    pub secondary_price_ratio_percent: u128,
}

impl Default for SpParams {
    fn default() -> Self {
        Self {
            min_deposit: 1_000_000,
            deposit_denom: "umoca".to_string(),
            secondary_price_ratio_percent: 12,
        }
    }
}
