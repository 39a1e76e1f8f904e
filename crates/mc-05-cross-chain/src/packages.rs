//! # Typed Packages
//!
//! One struct per operation format, each with an `encode`/`decode`
//! pair. V1 and V2 formats are distinct types with distinct decoders;
//! the channel layer picks the decoder from the operation byte alone.

use crate::codec::decode_exact;
use ethabi::{encode, ParamType, Token};
use shared_types::{Address, Uint};

/// Operation bytes shared by the entity channels.
pub mod ops {
    /// Mirror an entity to the destination chain (syn we emit; acks
    /// come back under the same byte).
    pub const MIRROR: u8 = 0x01;
    /// Create an entity (inbound syn).
    pub const CREATE: u8 = 0x02;
    /// Delete an entity (inbound syn).
    pub const DELETE: u8 = 0x03;
    /// Create a bucket, V2: adds the virtual-group family id.
    pub const CREATE_V2: u8 = 0x82;
}

fn addr_token(addr: Address) -> Token {
    Token::Address((*addr.as_bytes()).into())
}

fn token_addr(token: &Token) -> Address {
    match token {
        Token::Address(a) => Address::new(a.0),
        other => panic!("expected address token, got {other:?}"),
    }
}

fn token_uint(token: &Token) -> Uint {
    match token {
        Token::Uint(u) => {
            let mut bytes = [0u8; 32];
            u.to_big_endian(&mut bytes);
            Uint::from_big_endian(&bytes)
        }
        other => panic!("expected uint token, got {other:?}"),
    }
}

fn token_bytes(token: &Token) -> Vec<u8> {
    match token {
        Token::Bytes(b) => b.clone(),
        other => panic!("expected bytes token, got {other:?}"),
    }
}

fn token_string(token: &Token) -> String {
    match token {
        Token::String(s) => s.clone(),
        other => panic!("expected string token, got {other:?}"),
    }
}

fn token_fixed32(token: &Token) -> [u8; 32] {
    match token {
        Token::FixedBytes(b) if b.len() == 32 => {
            let mut out = [0u8; 32];
            out.copy_from_slice(b);
            out
        }
        other => panic!("expected bytes32 token, got {other:?}"),
    }
}

// =============================================================================
// BUCKET CHANNEL
// =============================================================================

/// Mirror syn we emit: `(id, owner)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorSynPackage {
    /// Mirrored entity id.
    pub id: Uint,
    /// Entity owner.
    pub owner: Address,
}

impl MirrorSynPackage {
    const TYPES: [ParamType; 2] = [ParamType::Uint(256), ParamType::Address];

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = [0u8; 32];
        self.id.to_big_endian(&mut bytes);
        encode(&[Token::Uint(ethabi::Uint::from_big_endian(&bytes)), addr_token(self.owner)])
    }

    /// Decode; panics on malformed bytes.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::TYPES, data);
        Self { id: token_uint(&tokens[0]), owner: token_addr(&tokens[1]) }
    }
}

/// Create-bucket syn, V1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateBucketSynPackage {
    /// Bucket owner on this chain.
    pub creator: Address,
    /// Bucket name.
    pub bucket_name: String,
    /// Stream account paying fees (zero → creator).
    pub payment_address: Address,
    /// Primary SP operator address.
    pub primary_sp_address: Address,
    /// Approval expiry height.
    pub expired_height: u64,
    /// 65-byte approval signature.
    pub approval_sig: Vec<u8>,
    /// The bytes the SP signed.
    pub approval_msg_bytes: Vec<u8>,
    /// Prepaid read quota.
    pub charged_read_quota: u64,
    /// Relayer extra data, echoed in acks.
    pub extra_data: Vec<u8>,
}

impl CreateBucketSynPackage {
    fn types() -> Vec<ParamType> {
        vec![
            ParamType::Address,
            ParamType::String,
            ParamType::Address,
            ParamType::Address,
            ParamType::Uint(64),
            ParamType::Bytes,
            ParamType::Bytes,
            ParamType::Uint(64),
            ParamType::Bytes,
        ]
    }

    fn tokens(&self) -> Vec<Token> {
        vec![
            addr_token(self.creator),
            Token::String(self.bucket_name.clone()),
            addr_token(self.payment_address),
            addr_token(self.primary_sp_address),
            Token::Uint(self.expired_height.into()),
            Token::Bytes(self.approval_sig.clone()),
            Token::Bytes(self.approval_msg_bytes.clone()),
            Token::Uint(self.charged_read_quota.into()),
            Token::Bytes(self.extra_data.clone()),
        ]
    }

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        encode(&self.tokens())
    }

    /// Decode; panics on malformed bytes.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::types(), data);
        Self {
            creator: token_addr(&tokens[0]),
            bucket_name: token_string(&tokens[1]),
            payment_address: token_addr(&tokens[2]),
            primary_sp_address: token_addr(&tokens[3]),
            expired_height: token_uint(&tokens[4]).low_u64(),
            approval_sig: token_bytes(&tokens[5]),
            approval_msg_bytes: token_bytes(&tokens[6]),
            charged_read_quota: token_uint(&tokens[7]).low_u64(),
            extra_data: token_bytes(&tokens[8]),
        }
    }
}

/// Create-bucket syn, V2: V1 plus the family id the approval binds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateBucketSynPackageV2 {
    /// The V1 fields.
    pub base: CreateBucketSynPackage,
    /// Family the SP routed the bucket to.
    pub global_virtual_group_family_id: u32,
}

impl CreateBucketSynPackageV2 {
    fn types() -> Vec<ParamType> {
        let mut types = CreateBucketSynPackage::types();
        // Family id slots in before the extra data tail.
        types.insert(8, ParamType::Uint(32));
        types
    }

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        let mut tokens = self.base.tokens();
        tokens.insert(8, Token::Uint(self.global_virtual_group_family_id.into()));
        encode(&tokens)
    }

    /// Decode; panics on malformed bytes. Never falls back to V1.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::types(), data);
        Self {
            base: CreateBucketSynPackage {
                creator: token_addr(&tokens[0]),
                bucket_name: token_string(&tokens[1]),
                payment_address: token_addr(&tokens[2]),
                primary_sp_address: token_addr(&tokens[3]),
                expired_height: token_uint(&tokens[4]).low_u64(),
                approval_sig: token_bytes(&tokens[5]),
                approval_msg_bytes: token_bytes(&tokens[6]),
                charged_read_quota: token_uint(&tokens[7]).low_u64(),
                extra_data: token_bytes(&tokens[9]),
            },
            global_virtual_group_family_id: token_uint(&tokens[8]).low_u32(),
        }
    }
}

/// Delete syn shared by bucket, object and group channels:
/// `(operator, id, extra)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteSynPackage {
    /// Acting account.
    pub operator: Address,
    /// Entity id.
    pub id: Uint,
    /// Relayer extra data.
    pub extra_data: Vec<u8>,
}

impl DeleteSynPackage {
    fn types() -> Vec<ParamType> {
        vec![ParamType::Address, ParamType::Uint(256), ParamType::Bytes]
    }

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        let mut id_bytes = [0u8; 32];
        self.id.to_big_endian(&mut id_bytes);
        encode(&[
            addr_token(self.operator),
            Token::Uint(ethabi::Uint::from_big_endian(&id_bytes)),
            Token::Bytes(self.extra_data.clone()),
        ])
    }

    /// Decode; panics on malformed bytes.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::types(), data);
        Self {
            operator: token_addr(&tokens[0]),
            id: token_uint(&tokens[1]),
            extra_data: token_bytes(&tokens[2]),
        }
    }
}

// =============================================================================
// GROUP CHANNEL
// =============================================================================

/// Create-group syn: `(owner, name, extra)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateGroupSynPackage {
    /// Group owner.
    pub owner: Address,
    /// Group name.
    pub group_name: String,
    /// Relayer extra data.
    pub extra_data: Vec<u8>,
}

impl CreateGroupSynPackage {
    fn types() -> Vec<ParamType> {
        vec![ParamType::Address, ParamType::String, ParamType::Bytes]
    }

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        encode(&[
            addr_token(self.owner),
            Token::String(self.group_name.clone()),
            Token::Bytes(self.extra_data.clone()),
        ])
    }

    /// Decode; panics on malformed bytes.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::types(), data);
        Self {
            owner: token_addr(&tokens[0]),
            group_name: token_string(&tokens[1]),
            extra_data: token_bytes(&tokens[2]),
        }
    }
}

// =============================================================================
// PERMISSION CHANNEL
// =============================================================================

/// Create-policy syn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatePolicySynPackage {
    /// Acting account (must own the resource).
    pub operator: Address,
    /// 0x01 account, 0x02 group.
    pub principal_type: u8,
    /// Account address (left-padded) or group id.
    pub principal_value: [u8; 32],
    /// Resource kind byte.
    pub resource_type: u8,
    /// Resource id.
    pub resource_id: Uint,
    /// Action byte (channel-specific table).
    pub action: u8,
    /// 0 allow, 1 deny.
    pub effect: u8,
    /// Unix seconds; 0 = never expires.
    pub expiration_time: u64,
    /// Relayer extra data.
    pub extra_data: Vec<u8>,
}

impl CreatePolicySynPackage {
    fn types() -> Vec<ParamType> {
        vec![
            ParamType::Address,
            ParamType::Uint(8),
            ParamType::FixedBytes(32),
            ParamType::Uint(8),
            ParamType::Uint(256),
            ParamType::Uint(8),
            ParamType::Uint(8),
            ParamType::Uint(64),
            ParamType::Bytes,
        ]
    }

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        let mut id_bytes = [0u8; 32];
        self.resource_id.to_big_endian(&mut id_bytes);
        encode(&[
            addr_token(self.operator),
            Token::Uint(self.principal_type.into()),
            Token::FixedBytes(self.principal_value.to_vec()),
            Token::Uint(self.resource_type.into()),
            Token::Uint(ethabi::Uint::from_big_endian(&id_bytes)),
            Token::Uint(self.action.into()),
            Token::Uint(self.effect.into()),
            Token::Uint(self.expiration_time.into()),
            Token::Bytes(self.extra_data.clone()),
        ])
    }

    /// Decode; panics on malformed bytes.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::types(), data);
        Self {
            operator: token_addr(&tokens[0]),
            principal_type: token_uint(&tokens[1]).low_u32() as u8,
            principal_value: token_fixed32(&tokens[2]),
            resource_type: token_uint(&tokens[3]).low_u32() as u8,
            resource_id: token_uint(&tokens[4]),
            action: token_uint(&tokens[5]).low_u32() as u8,
            effect: token_uint(&tokens[6]).low_u32() as u8,
            expiration_time: token_uint(&tokens[7]).low_u64(),
            extra_data: token_bytes(&tokens[8]),
        }
    }
}

/// Delete-policy syn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletePolicySynPackage {
    /// Acting account.
    pub operator: Address,
    /// 0x01 account, 0x02 group.
    pub principal_type: u8,
    /// Account address (left-padded) or group id.
    pub principal_value: [u8; 32],
    /// Resource kind byte.
    pub resource_type: u8,
    /// Resource id.
    pub resource_id: Uint,
    /// Relayer extra data.
    pub extra_data: Vec<u8>,
}

impl DeletePolicySynPackage {
    fn types() -> Vec<ParamType> {
        vec![
            ParamType::Address,
            ParamType::Uint(8),
            ParamType::FixedBytes(32),
            ParamType::Uint(8),
            ParamType::Uint(256),
            ParamType::Bytes,
        ]
    }

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        let mut id_bytes = [0u8; 32];
        self.resource_id.to_big_endian(&mut id_bytes);
        encode(&[
            addr_token(self.operator),
            Token::Uint(self.principal_type.into()),
            Token::FixedBytes(self.principal_value.to_vec()),
            Token::Uint(self.resource_type.into()),
            Token::Uint(ethabi::Uint::from_big_endian(&id_bytes)),
            Token::Bytes(self.extra_data.clone()),
        ])
    }

    /// Decode; panics on malformed bytes.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::types(), data);
        Self {
            operator: token_addr(&tokens[0]),
            principal_type: token_uint(&tokens[1]).low_u32() as u8,
            principal_value: token_fixed32(&tokens[2]),
            resource_type: token_uint(&tokens[3]).low_u32() as u8,
            resource_id: token_uint(&tokens[4]),
            extra_data: token_bytes(&tokens[5]),
        }
    }
}

// =============================================================================
// MOCA SBT / VC CHANNELS
// =============================================================================

/// Mint a soulbound token: `(to, id, uri, extra)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintSbtSynPackage {
    /// Recipient.
    pub to: Address,
    /// Token id.
    pub token_id: Uint,
    /// Metadata URI.
    pub uri: String,
    /// Relayer extra data.
    pub extra_data: Vec<u8>,
}

impl MintSbtSynPackage {
    fn types() -> Vec<ParamType> {
        vec![ParamType::Address, ParamType::Uint(256), ParamType::String, ParamType::Bytes]
    }

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        let mut id_bytes = [0u8; 32];
        self.token_id.to_big_endian(&mut id_bytes);
        encode(&[
            addr_token(self.to),
            Token::Uint(ethabi::Uint::from_big_endian(&id_bytes)),
            Token::String(self.uri.clone()),
            Token::Bytes(self.extra_data.clone()),
        ])
    }

    /// Decode; panics on malformed bytes.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::types(), data);
        Self {
            to: token_addr(&tokens[0]),
            token_id: token_uint(&tokens[1]),
            uri: token_string(&tokens[2]),
            extra_data: token_bytes(&tokens[3]),
        }
    }
}

/// Burn a soulbound token: `(id, extra)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurnSbtSynPackage {
    /// Token id.
    pub token_id: Uint,
    /// Relayer extra data.
    pub extra_data: Vec<u8>,
}

impl BurnSbtSynPackage {
    fn types() -> Vec<ParamType> {
        vec![ParamType::Uint(256), ParamType::Bytes]
    }

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        let mut id_bytes = [0u8; 32];
        self.token_id.to_big_endian(&mut id_bytes);
        encode(&[Token::Uint(ethabi::Uint::from_big_endian(&id_bytes)), Token::Bytes(self.extra_data.clone())])
    }

    /// Decode; panics on malformed bytes.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::types(), data);
        Self { token_id: token_uint(&tokens[0]), extra_data: token_bytes(&tokens[1]) }
    }
}

/// Register a credential hash: `(issuer, hash, extra)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterVcSynPackage {
    /// Issuing account.
    pub issuer: Address,
    /// Credential hash.
    pub vc_hash: [u8; 32],
    /// Relayer extra data.
    pub extra_data: Vec<u8>,
}

impl RegisterVcSynPackage {
    fn types() -> Vec<ParamType> {
        vec![ParamType::Address, ParamType::FixedBytes(32), ParamType::Bytes]
    }

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        encode(&[
            addr_token(self.issuer),
            Token::FixedBytes(self.vc_hash.to_vec()),
            Token::Bytes(self.extra_data.clone()),
        ])
    }

    /// Decode; panics on malformed bytes.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::types(), data);
        Self {
            issuer: token_addr(&tokens[0]),
            vc_hash: token_fixed32(&tokens[1]),
            extra_data: token_bytes(&tokens[2]),
        }
    }
}

/// Revoke a credential hash: `(hash, extra)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevokeVcSynPackage {
    /// Credential hash.
    pub vc_hash: [u8; 32],
    /// Relayer extra data.
    pub extra_data: Vec<u8>,
}

impl RevokeVcSynPackage {
    fn types() -> Vec<ParamType> {
        vec![ParamType::FixedBytes(32), ParamType::Bytes]
    }

    /// ABI-encode.
    pub fn encode(&self) -> Vec<u8> {
        encode(&[
            Token::FixedBytes(self.vc_hash.to_vec()),
            Token::Bytes(self.extra_data.clone()),
        ])
    }

    /// Decode; panics on malformed bytes.
    pub fn decode(data: &[u8]) -> Self {
        let tokens = decode_exact(&Self::types(), data);
        Self { vc_hash: token_fixed32(&tokens[0]), extra_data: token_bytes(&tokens[1]) }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_create_bucket_v2_fieldwise_roundtrip() {
        let package = CreateBucketSynPackageV2 {
            base: CreateBucketSynPackage {
                creator: addr(1),
                bucket_name: "bridged-bucket".to_string(),
                payment_address: addr(2),
                primary_sp_address: addr(3),
                expired_height: 12_345,
                approval_sig: vec![0xAB; 65],
                approval_msg_bytes: b"approval".to_vec(),
                charged_read_quota: 77,
                extra_data: b"relayer".to_vec(),
            },
            global_virtual_group_family_id: 7,
        };
        let decoded = CreateBucketSynPackageV2::decode(&package.encode());
        assert_eq!(decoded, package);
    }

    #[test]
    #[should_panic(expected = "cross-chain package")]
    fn test_v2_bytes_rejected_by_v1_decoder() {
        let package = CreateBucketSynPackageV2 {
            base: CreateBucketSynPackage {
                creator: addr(1),
                bucket_name: "bridged-bucket".to_string(),
                payment_address: addr(2),
                primary_sp_address: addr(3),
                expired_height: 12_345,
                approval_sig: vec![0xAB; 65],
                approval_msg_bytes: b"approval".to_vec(),
                charged_read_quota: 77,
                extra_data: b"relayer".to_vec(),
            },
            global_virtual_group_family_id: 7,
        };
        // The V1 decoder must reject V2 bytes rather than reinterpret.
        CreateBucketSynPackage::decode(&package.encode());
    }

    #[test]
    fn test_delete_and_mirror_roundtrip() {
        let delete = DeleteSynPackage {
            operator: addr(9),
            id: Uint::from(555u64),
            extra_data: Vec::new(),
        };
        assert_eq!(DeleteSynPackage::decode(&delete.encode()), delete);

        let mirror = MirrorSynPackage { id: Uint::from(1u64), owner: addr(4) };
        assert_eq!(MirrorSynPackage::decode(&mirror.encode()), mirror);
    }

    #[test]
    fn test_policy_roundtrip() {
        let package = CreatePolicySynPackage {
            operator: addr(1),
            principal_type: 1,
            principal_value: [0x22; 32],
            resource_type: 1,
            resource_id: Uint::from(88u64),
            action: 3,
            effect: 0,
            expiration_time: 0,
            extra_data: b"x".to_vec(),
        };
        assert_eq!(CreatePolicySynPackage::decode(&package.encode()), package);
    }
}
