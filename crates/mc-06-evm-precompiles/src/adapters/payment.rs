//! # Payment Precompile
//!
//! Methods: `deposit(address,uint256)` and `withdraw(address,uint256)`.
//! Flat gas; the stream engine's own costs dominate.

use super::selector;
use crate::addresses;
use crate::errors::PrecompileError;
use crate::gas;
use crate::precompile::{calldata, EvmLog, Precompile, PrecompileOutput};
use crate::topics::address_topic;
use ethabi::{ParamType, Token};
use mc_01_payment::PaymentService;
use shared_store::Context;
use shared_types::Address;
use std::sync::Arc;

/// Payment adapter at [`addresses::PAYMENT`].
pub struct PaymentPrecompile {
    payment: Arc<PaymentService>,
}

impl PaymentPrecompile {
    /// Build over the payment service.
    pub fn new(payment: Arc<PaymentService>) -> Self {
        Self { payment }
    }

    fn transfer_types() -> Vec<ParamType> {
        vec![ParamType::Address, ParamType::Uint(256)]
    }
}

impl Precompile for PaymentPrecompile {
    fn address(&self) -> Address {
        addresses::PAYMENT
    }

    fn required_gas(&self, _input: &[u8]) -> u64 {
        gas::costs::BASE
    }

    fn run(
        &self,
        ctx: &mut Context<'_>,
        caller: Address,
        input: &[u8],
    ) -> Result<PrecompileOutput, PrecompileError> {
        let (method, args) = calldata::split_selector(input)?;
        let tokens = calldata::decode_args(&Self::transfer_types(), args)?;
        let target = match &tokens[0] {
            Token::Address(a) => Address::new(a.0),
            _ => return Err(PrecompileError::InvalidInput("expected address".into())),
        };
        let amount = match &tokens[1] {
            Token::Uint(u) => u.low_u128(),
            _ => return Err(PrecompileError::InvalidInput("expected uint".into())),
        };

        if method == selector("deposit(address,uint256)") {
            self.payment
                .deposit(ctx, caller, target, amount)
                .map_err(|e| PrecompileError::Reverted(e.to_string()))?;
        } else if method == selector("withdraw(address,uint256)") {
            self.payment
                .withdraw(ctx, caller, target, amount)
                .map_err(|e| PrecompileError::Reverted(e.to_string()))?;
        } else {
            return Err(PrecompileError::UnknownSelector);
        }

        Ok(PrecompileOutput {
            output: ethabi::encode(&[Token::Bool(true)]),
            logs: vec![EvmLog {
                address: addresses::PAYMENT,
                topics: vec![address_topic(caller), address_topic(target)],
                data: ethabi::encode(&[Token::Uint(amount.into())]),
            }],
        })
    }
}
