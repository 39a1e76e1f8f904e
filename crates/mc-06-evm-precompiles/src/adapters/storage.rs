//! # Storage Precompile
//!
//! Methods: `discontinueObject(string,string[])`,
//! `renewGroupMember(address,string,address[],uint64[])`,
//! `updateGroup(address,string,address[],address[])`.

use super::selector;
use crate::addresses;
use crate::errors::PrecompileError;
use crate::gas;
use crate::precompile::{calldata, EvmLog, Precompile, PrecompileOutput};
use crate::topics::{address_topic, string_topic};
use ethabi::{ParamType, Token};
use mc_04_storage::StorageService;
use shared_store::Context;
use shared_types::Address;
use std::sync::Arc;

/// Storage adapter at [`addresses::STORAGE`].
pub struct StoragePrecompile {
    storage: Arc<StorageService>,
}

impl StoragePrecompile {
    /// Build over the storage service.
    pub fn new(storage: Arc<StorageService>) -> Self {
        Self { storage }
    }

    fn discontinue_types() -> Vec<ParamType> {
        vec![ParamType::String, ParamType::Array(Box::new(ParamType::String))]
    }

    fn renew_types() -> Vec<ParamType> {
        vec![
            ParamType::Address,
            ParamType::String,
            ParamType::Array(Box::new(ParamType::Address)),
            ParamType::Array(Box::new(ParamType::Uint(64))),
        ]
    }

    fn update_types() -> Vec<ParamType> {
        vec![
            ParamType::Address,
            ParamType::String,
            ParamType::Array(Box::new(ParamType::Address)),
            ParamType::Array(Box::new(ParamType::Address)),
        ]
    }
}

fn token_strings(token: &Token) -> Result<Vec<String>, PrecompileError> {
    match token {
        Token::Array(items) => items
            .iter()
            .map(|item| match item {
                Token::String(s) => Ok(s.clone()),
                _ => Err(PrecompileError::InvalidInput("expected string array".into())),
            })
            .collect(),
        _ => Err(PrecompileError::InvalidInput("expected array".into())),
    }
}

fn token_addresses(token: &Token) -> Result<Vec<Address>, PrecompileError> {
    match token {
        Token::Array(items) => items
            .iter()
            .map(|item| match item {
                Token::Address(a) => Ok(Address::new(a.0)),
                _ => Err(PrecompileError::InvalidInput("expected address array".into())),
            })
            .collect(),
        _ => Err(PrecompileError::InvalidInput("expected array".into())),
    }
}

fn token_u64s(token: &Token) -> Result<Vec<u64>, PrecompileError> {
    match token {
        Token::Array(items) => items
            .iter()
            .map(|item| match item {
                Token::Uint(u) => Ok(u.low_u64()),
                _ => Err(PrecompileError::InvalidInput("expected uint array".into())),
            })
            .collect(),
        _ => Err(PrecompileError::InvalidInput("expected array".into())),
    }
}

fn token_string(token: &Token) -> Result<String, PrecompileError> {
    match token {
        Token::String(s) => Ok(s.clone()),
        _ => Err(PrecompileError::InvalidInput("expected string".into())),
    }
}

fn token_address(token: &Token) -> Result<Address, PrecompileError> {
    match token {
        Token::Address(a) => Ok(Address::new(a.0)),
        _ => Err(PrecompileError::InvalidInput("expected address".into())),
    }
}

impl Precompile for StoragePrecompile {
    fn address(&self) -> Address {
        addresses::STORAGE
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        let Ok((method, args)) = calldata::split_selector(input) else {
            return gas::costs::BASE;
        };
        if method == selector("discontinueObject(string,string[])") {
            let ids = calldata::decode_args(&Self::discontinue_types(), args)
                .ok()
                .and_then(|tokens| token_strings(&tokens[1]).ok())
                .map(|names| names.len() as u64)
                .unwrap_or(0);
            gas::discontinue_object_gas(ids)
        } else if method == selector("renewGroupMember(address,string,address[],uint64[])") {
            let members = calldata::decode_args(&Self::renew_types(), args)
                .ok()
                .and_then(|tokens| token_addresses(&tokens[2]).ok())
                .map(|members| members.len() as u64)
                .unwrap_or(0);
            gas::renew_group_member_gas(members)
        } else if method == selector("updateGroup(address,string,address[],address[])") {
            let (adds, removes) = calldata::decode_args(&Self::update_types(), args)
                .ok()
                .and_then(|tokens| {
                    let adds = token_addresses(&tokens[2]).ok()?;
                    let removes = token_addresses(&tokens[3]).ok()?;
                    Some((adds.len() as u64, removes.len() as u64))
                })
                .unwrap_or((0, 0));
            gas::update_group_gas(adds, removes)
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
        if method == selector("discontinueObject(string,string[])") {
            let tokens = calldata::decode_args(&Self::discontinue_types(), args)?;
            let bucket_name = token_string(&tokens[0])?;
            let object_names = token_strings(&tokens[1])?;
            self.storage
                .discontinue_objects(ctx, caller, &bucket_name, &object_names)
                .map_err(|e| PrecompileError::Reverted(e.to_string()))?;
            Ok(PrecompileOutput {
                output: ethabi::encode(&[Token::Bool(true)]),
                logs: vec![EvmLog {
                    address: addresses::STORAGE,
                    topics: vec![string_topic(&bucket_name), address_topic(caller)],
                    data: Vec::new(),
                }],
            })
        } else if method == selector("renewGroupMember(address,string,address[],uint64[])") {
            let tokens = calldata::decode_args(&Self::renew_types(), args)?;
            let owner = token_address(&tokens[0])?;
            let group_name = token_string(&tokens[1])?;
            let members = token_addresses(&tokens[2])?;
            let expirations = token_u64s(&tokens[3])?;
            if members.len() != expirations.len() {
                return Err(PrecompileError::InvalidInput("member/expiry length mismatch".into()));
            }
            let renewals = members
                .into_iter()
                .zip(expirations)
                .map(|(member, exp)| (member, (exp > 0).then_some(exp as i64)))
                .collect();
            self.storage
                .renew_group_members(ctx, caller, owner, &group_name, renewals)
                .map_err(|e| PrecompileError::Reverted(e.to_string()))?;
            Ok(PrecompileOutput {
                output: ethabi::encode(&[Token::Bool(true)]),
                logs: vec![EvmLog {
                    address: addresses::STORAGE,
                    topics: vec![string_topic(&group_name), address_topic(owner)],
                    data: Vec::new(),
                }],
            })
        } else if method == selector("updateGroup(address,string,address[],address[])") {
            let tokens = calldata::decode_args(&Self::update_types(), args)?;
            let owner = token_address(&tokens[0])?;
            let group_name = token_string(&tokens[1])?;
            let adds = token_addresses(&tokens[2])?
                .into_iter()
                .map(|member| (member, None))
                .collect();
            let removes = token_addresses(&tokens[3])?;
            self.storage
                .update_group_members(ctx, caller, owner, &group_name, adds, removes)
                .map_err(|e| PrecompileError::Reverted(e.to_string()))?;
            Ok(PrecompileOutput {
                output: ethabi::encode(&[Token::Bool(true)]),
                logs: vec![EvmLog {
                    address: addresses::STORAGE,
                    topics: vec![string_topic(&group_name), address_topic(owner)],
                    data: Vec::new(),
                }],
            })
        } else {
            Err(PrecompileError::UnknownSelector)
        }
    }
}
