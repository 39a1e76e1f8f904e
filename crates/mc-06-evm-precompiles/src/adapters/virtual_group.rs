//! # Virtual-Group Precompile
//!
//! Methods: `swapOut(uint32,uint32[],uint32,uint64,bytes)` and
//! `completeSwapOut(uint32,uint32[])`. Gas is
//! `60_000 + 20_000 · |gvgIds|`, bounded by the 50-group message limit.

use super::selector;
use crate::addresses;
use crate::errors::PrecompileError;
use crate::gas;
use crate::precompile::{calldata, Precompile, PrecompileOutput};
use ethabi::{ParamType, Token};
use mc_03_virtual_group::service::SuccessorApproval;
use mc_03_virtual_group::VirtualGroupService;
use shared_crypto::EcdsaSignature;
use shared_store::Context;
use shared_types::Address;
use std::sync::Arc;

/// Virtual-group adapter at [`addresses::VIRTUAL_GROUP`].
pub struct VirtualGroupPrecompile {
    vg: Arc<VirtualGroupService>,
}

impl VirtualGroupPrecompile {
    /// Build over the virtual-group service.
    pub fn new(vg: Arc<VirtualGroupService>) -> Self {
        Self { vg }
    }

    fn swap_out_types() -> Vec<ParamType> {
        vec![
            ParamType::Uint(32),
            ParamType::Array(Box::new(ParamType::Uint(32))),
            ParamType::Uint(32),
            ParamType::Uint(64),
            ParamType::Bytes,
        ]
    }

    fn complete_types() -> Vec<ParamType> {
        vec![ParamType::Uint(32), ParamType::Array(Box::new(ParamType::Uint(32)))]
    }

    fn gvg_count(types: &[ParamType], args: &[u8], index: usize) -> u64 {
        calldata::decode_args(types, args)
            .ok()
            .and_then(|tokens| match &tokens[index] {
                Token::Array(items) => Some(items.len() as u64),
                _ => None,
            })
            .unwrap_or(0)
    }
}

fn token_u32s(token: &Token) -> Result<Vec<u32>, PrecompileError> {
    match token {
        Token::Array(items) => items
            .iter()
            .map(|item| match item {
                Token::Uint(u) => Ok(u.low_u32()),
                _ => Err(PrecompileError::InvalidInput("expected uint array".into())),
            })
            .collect(),
        _ => Err(PrecompileError::InvalidInput("expected array".into())),
    }
}

fn token_u32(token: &Token) -> Result<u32, PrecompileError> {
    match token {
        Token::Uint(u) => Ok(u.low_u32()),
        _ => Err(PrecompileError::InvalidInput("expected uint".into())),
    }
}

impl Precompile for VirtualGroupPrecompile {
    fn address(&self) -> Address {
        addresses::VIRTUAL_GROUP
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        let Ok((method, args)) = calldata::split_selector(input) else {
            return gas::costs::BASE;
        };
        if method == selector("swapOut(uint32,uint32[],uint32,uint64,bytes)") {
            gas::swap_out_gas(Self::gvg_count(&Self::swap_out_types(), args, 1))
        } else if method == selector("completeSwapOut(uint32,uint32[])") {
            gas::complete_swap_out_gas(Self::gvg_count(&Self::complete_types(), args, 1))
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
        if method == selector("swapOut(uint32,uint32[],uint32,uint64,bytes)") {
            let tokens = calldata::decode_args(&Self::swap_out_types(), args)?;
            let family_id = token_u32(&tokens[0])?;
            let gvg_ids = token_u32s(&tokens[1])?;
            let successor = token_u32(&tokens[2])?;
            let expired_height = match &tokens[3] {
                Token::Uint(u) => u.low_u64(),
                _ => return Err(PrecompileError::InvalidInput("expected uint".into())),
            };
            let Token::Bytes(sig_bytes) = &tokens[4] else {
                return Err(PrecompileError::InvalidInput("expected bytes".into()));
            };
            let sig = EcdsaSignature::from_slice(sig_bytes)
                .map_err(|e| PrecompileError::InvalidInput(e.to_string()))?;
            self.vg
                .swap_out(
                    ctx,
                    caller,
                    family_id,
                    &gvg_ids,
                    successor,
                    &SuccessorApproval { expired_height, sig },
                )
                .map_err(|e| PrecompileError::Reverted(e.to_string()))?;
            Ok(PrecompileOutput { output: ethabi::encode(&[Token::Bool(true)]), logs: Vec::new() })
        } else if method == selector("completeSwapOut(uint32,uint32[])") {
            let tokens = calldata::decode_args(&Self::complete_types(), args)?;
            let family_id = token_u32(&tokens[0])?;
            let gvg_ids = token_u32s(&tokens[1])?;
            self.vg
                .complete_swap_out(ctx, caller, family_id, &gvg_ids)
                .map_err(|e| PrecompileError::Reverted(e.to_string()))?;
            Ok(PrecompileOutput { output: ethabi::encode(&[Token::Bool(true)]), logs: Vec::new() })
        } else {
            Err(PrecompileError::UnknownSelector)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
