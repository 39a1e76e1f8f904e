//! # Governance Precompile
//!
//! Method: `submitProposal(bytes[],string)`. The gas surcharge counts
//! the inner messages and the total payload bytes, both capped. The
//! proposal record lands in the upgrade namespace for the governance
//! process to pick up.

use super::selector;
use crate::addresses;
use crate::errors::PrecompileError;
use crate::gas;
use crate::precompile::{calldata, EvmLog, Precompile, PrecompileOutput};
use crate::topics::address_topic;
use ethabi::{ParamType, Token};
use serde::{Deserialize, Serialize};
use shared_crypto::keccak256;
use shared_store::kv::{get_obj, namespaces, put_obj};
use shared_store::Context;
use shared_types::Address;

const PROPOSAL: u8 = 0x10;
const PROPOSAL_SEQ: u8 = 0x11;

/// A submitted proposal awaiting governance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Submitting account.
    pub proposer: Address,
    /// Encoded inner messages.
    pub messages: Vec<Vec<u8>>,
    /// Metadata string.
    pub metadata: String,
    /// Unix seconds of submission.
    pub submitted_at: i64,
}

fn proposal_key(id: u64) -> Vec<u8> {
    let mut key = vec![namespaces::UPGRADE, PROPOSAL];
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Governance adapter at [`addresses::GOV`].
#[derive(Default)]
pub struct GovPrecompile;

impl GovPrecompile {
    fn submit_types() -> Vec<ParamType> {
        vec![ParamType::Array(Box::new(ParamType::Bytes)), ParamType::String]
    }

    /// Proposal by id.
    pub fn get_proposal(store: &dyn shared_store::KvRead, id: u64) -> Option<Proposal> {
        get_obj(store, &proposal_key(id))
    }
}

impl Precompile for GovPrecompile {
    fn address(&self) -> Address {
        addresses::GOV
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        let Ok((method, args)) = calldata::split_selector(input) else {
            return gas::costs::BASE;
        };
        if method != selector("submitProposal(bytes[],string)") {
            return gas::costs::BASE;
        }
        let (num_msgs, payload_size) = calldata::decode_args(&Self::submit_types(), args)
            .ok()
            .and_then(|tokens| match &tokens[0] {
                Token::Array(items) => {
                    let total: usize = items
                        .iter()
                        .map(|item| match item {
                            Token::Bytes(b) => b.len(),
                            _ => 0,
                        })
                        .sum();
                    Some((items.len() as u64, total as u64))
                }
                _ => None,
            })
            .unwrap_or((0, 0));
        gas::submit_proposal_gas(num_msgs, payload_size)
    }

    fn run(
        &self,
        ctx: &mut Context<'_>,
        caller: Address,
        input: &[u8],
    ) -> Result<PrecompileOutput, PrecompileError> {
        let (method, args) = calldata::split_selector(input)?;
        if method != selector("submitProposal(bytes[],string)") {
            return Err(PrecompileError::UnknownSelector);
        }
        let tokens = calldata::decode_args(&Self::submit_types(), args)?;
        let Token::Array(message_tokens) = &tokens[0] else {
            return Err(PrecompileError::InvalidInput("expected bytes array".into()));
        };
        let mut messages = Vec::with_capacity(message_tokens.len());
        for token in message_tokens {
            match token {
                Token::Bytes(b) => messages.push(b.clone()),
                _ => return Err(PrecompileError::InvalidInput("expected bytes".into())),
            }
        }
        let Token::String(metadata) = &tokens[1] else {
            return Err(PrecompileError::InvalidInput("expected string".into()));
        };
        if messages.is_empty() {
            return Err(PrecompileError::Reverted("proposal has no messages".to_string()));
        }

        let seq_key = vec![namespaces::UPGRADE, PROPOSAL_SEQ];
        let id: u64 = get_obj(&ctx.store, &seq_key).unwrap_or(1);
        put_obj(&mut ctx.store, seq_key, &(id + 1));
        put_obj(
            &mut ctx.store,
            proposal_key(id),
            &Proposal {
                proposer: caller,
                messages,
                metadata: metadata.clone(),
                submitted_at: ctx.block.time,
            },
        );

        Ok(PrecompileOutput {
            output: ethabi::encode(&[Token::Uint(id.into())]),
            logs: vec![EvmLog {
                address: addresses::GOV,
                topics: vec![
                    keccak256(b"ProposalSubmitted(address,uint64)"),
                    address_topic(caller),
                ],
                data: ethabi::encode(&[Token::Uint(id.into())]),
            }],
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::costs;
    use shared_store::MemStore;
    use shared_types::BlockContext;

    fn submit_calldata(msgs: &[&[u8]], metadata: &str) -> Vec<u8> {
        let mut input = selector("submitProposal(bytes[],string)").to_vec();
        input.extend_from_slice(&ethabi::encode(&[
            Token::Array(msgs.iter().map(|m| Token::Bytes(m.to_vec())).collect()),
            Token::String(metadata.to_string()),
        ]));
        input
    }

    #[test]
    fn test_submit_proposal_gas_and_store() {
        let precompile = GovPrecompile;
        let calldata = submit_calldata(&[b"msg-one", b"msg-two"], "upgrade");
        assert_eq!(
            precompile.required_gas(&calldata),
            costs::BASE + 2 * costs::PER_MSG + 14 * costs::PER_BYTE
        );

        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(1, 77));
        let output = precompile.run(&mut ctx, Address::new([1; 20]), &calldata).unwrap();
        assert!(!output.logs.is_empty());
        let proposal = GovPrecompile::get_proposal(&ctx.store, 1).unwrap();
        assert_eq!(proposal.messages.len(), 2);
        assert_eq!(proposal.metadata, "upgrade");
    }

    #[test]
    fn test_empty_proposal_reverts() {
        let precompile = GovPrecompile;
        let store = MemStore::new();
        let mut ctx = Context::new(&store, BlockContext::new(1, 77));
        let err = precompile
            .run(&mut ctx, Address::new([1; 20]), &submit_calldata(&[], "x"))
            .unwrap_err();
        assert!(matches!(err, PrecompileError::Reverted(_)));
    }
}
