//! # Permission Precompile
//!
//! Methods:
//! `putPolicy(uint8,bytes32,uint8,uint256,uint8[],uint8,uint64)` and
//! `deletePolicy(uint8,bytes32,uint8,uint256)`. One statement per call;
//! the gas surcharge counts its actions.

use super::selector;
use crate::addresses;
use crate::errors::PrecompileError;
use crate::gas;
use crate::precompile::{calldata, Precompile, PrecompileOutput};
use ethabi::{ParamType, Token};
use mc_04_storage::domain::value_objects::Resource;
use mc_04_storage::{ActionType, Effect, Principal, ResourceType, Statement, StorageService};
use shared_store::Context;
use shared_types::{Address, Uint};
use std::sync::Arc;

/// Permission adapter at [`addresses::PERMISSION`].
pub struct PermissionPrecompile {
    storage: Arc<StorageService>,
}

impl PermissionPrecompile {
    /// Build over the storage service.
    pub fn new(storage: Arc<StorageService>) -> Self {
        Self { storage }
    }

    fn put_types() -> Vec<ParamType> {
        vec![
            ParamType::Uint(8),
            ParamType::FixedBytes(32),
            ParamType::Uint(8),
            ParamType::Uint(256),
            ParamType::Array(Box::new(ParamType::Uint(8))),
            ParamType::Uint(8),
            ParamType::Uint(64),
        ]
    }

    fn delete_types() -> Vec<ParamType> {
        vec![
            ParamType::Uint(8),
            ParamType::FixedBytes(32),
            ParamType::Uint(8),
            ParamType::Uint(256),
        ]
    }
}

fn principal_from(ty: u8, value: &[u8]) -> Result<Principal, PrecompileError> {
    match ty {
        0x01 => {
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&value[12..32]);
            Ok(Principal::Account(Address::new(addr)))
        }
        0x02 => Ok(Principal::Group(Uint::from_big_endian(value))),
        other => Err(PrecompileError::InvalidInput(format!("unknown principal type {other}"))),
    }
}

fn resource_from(ty: u8) -> Result<ResourceType, PrecompileError> {
    match ty {
        0x01 => Ok(ResourceType::Bucket),
        0x02 => Ok(ResourceType::Object),
        0x03 => Ok(ResourceType::Group),
        other => Err(PrecompileError::InvalidInput(format!("unknown resource type {other}"))),
    }
}

fn action_from(byte: u8) -> Result<ActionType, PrecompileError> {
    Ok(match byte {
        0x00 => ActionType::TypeAll,
        0x01 => ActionType::UpdateBucketInfo,
        0x02 => ActionType::DeleteBucket,
        0x03 => ActionType::CreateObject,
        0x04 => ActionType::DeleteObject,
        0x05 => ActionType::CopyObject,
        0x06 => ActionType::GetObject,
        0x07 => ActionType::UpdateObjectContent,
        0x08 => ActionType::UpdateGroupMember,
        0x09 => ActionType::DeleteGroup,
        0x0A => ActionType::UpdateGroupExtra,
        other => {
            return Err(PrecompileError::InvalidInput(format!("unknown action byte {other}")))
        }
    })
}

fn uint_to_shared(token: &Token) -> Uint {
    match token {
        Token::Uint(u) => {
            let mut bytes = [0u8; 32];
            u.to_big_endian(&mut bytes);
            Uint::from_big_endian(&bytes)
        }
        _ => Uint::zero(),
    }
}

impl Precompile for PermissionPrecompile {
    fn address(&self) -> Address {
        addresses::PERMISSION
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        let Ok((method, args)) = calldata::split_selector(input) else {
            return gas::costs::BASE;
        };
        if method == selector("putPolicy(uint8,bytes32,uint8,uint256,uint8[],uint8,uint64)") {
            let actions = calldata::decode_args(&Self::put_types(), args)
                .ok()
                .and_then(|tokens| match &tokens[4] {
                    Token::Array(items) => Some(items.len() as u64),
                    _ => None,
                })
                .unwrap_or(0);
            // One statement, one resource per call.
            gas::put_policy_gas(1, actions, 1)
        } else {
            gas::costs::BASE
        }
    }

    fn run(
        &self,
        ctx: &mut Context<'_>,
        caller: Address,
        input: &[u8],
    ) -> Result<PrecompileOutput, PrecompileError> {
        let (method, args) = calldata::split_selector(input)?;
        if method == selector("putPolicy(uint8,bytes32,uint8,uint256,uint8[],uint8,uint64)") {
            let tokens = calldata::decode_args(&Self::put_types(), args)?;
            let principal_type = uint_to_shared(&tokens[0]).low_u32() as u8;
            let Token::FixedBytes(principal_value) = &tokens[1] else {
                return Err(PrecompileError::InvalidInput("expected bytes32".into()));
            };
            let resource_type = uint_to_shared(&tokens[2]).low_u32() as u8;
            let resource_id = uint_to_shared(&tokens[3]);
            let Token::Array(action_tokens) = &tokens[4] else {
                return Err(PrecompileError::InvalidInput("expected action array".into()));
            };
            let mut actions = Vec::with_capacity(action_tokens.len());
            for token in action_tokens {
                actions.push(action_from(uint_to_shared(token).low_u32() as u8)?);
            }
            let effect = if uint_to_shared(&tokens[5]).is_zero() {
                Effect::Allow
            } else {
                Effect::Deny
            };
            let expiration = uint_to_shared(&tokens[6]).low_u64();

            let id = self
                .storage
                .put_policy(
                    ctx,
                    caller,
                    principal_from(principal_type, principal_value)?,
                    Resource {
                        resource_type: resource_from(resource_type)?,
                        resource_id,
                    },
                    vec![Statement {
                        actions,
                        effect,
                        expiration_time: (expiration > 0).then_some(expiration as i64),
                    }],
                    None,
                )
                .map_err(|e| PrecompileError::Reverted(e.to_string()))?;
            let mut id_bytes = [0u8; 32];
            id.to_big_endian(&mut id_bytes);
            Ok(PrecompileOutput {
                output: ethabi::encode(&[Token::Uint(ethabi::Uint::from_big_endian(&id_bytes))]),
                logs: Vec::new(),
            })
        } else if method == selector("deletePolicy(uint8,bytes32,uint8,uint256)") {
            let tokens = calldata::decode_args(&Self::delete_types(), args)?;
            let principal_type = uint_to_shared(&tokens[0]).low_u32() as u8;
            let Token::FixedBytes(principal_value) = &tokens[1] else {
                return Err(PrecompileError::InvalidInput("expected bytes32".into()));
            };
            let resource_type = uint_to_shared(&tokens[2]).low_u32() as u8;
            let resource_id = uint_to_shared(&tokens[3]);
            self.storage
                .delete_policy(
                    ctx,
                    caller,
                    principal_from(principal_type, principal_value)?,
                    Resource {
                        resource_type: resource_from(resource_type)?,
                        resource_id,
                    },
                )
                .map_err(|e| PrecompileError::Reverted(e.to_string()))?;
            Ok(PrecompileOutput {
                output: ethabi::encode(&[Token::Bool(true)]),
                logs: Vec::new(),
            })
        } else {
            Err(PrecompileError::UnknownSelector)
        }
    }
}
