//! # Payment Ports
//!
//! Inbound port consumed by the storage and virtual-group engines. The
//! concrete implementation is [`crate::service::PaymentService`]; tests
//! in consuming crates may substitute their own.

use crate::domain::entities::{PaymentParams, StreamRecord};
use crate::domain::errors::PaymentError;
use crate::domain::value_objects::{StreamRecordChange, UserFlows};
use shared_store::{Context, KvRead};
use shared_types::Address;

/// Operations other modules may drive the payment engine with.
pub trait PaymentApi: Send + Sync {
    /// Apply a payer's outflow deltas plus the mirrored recipient changes.
    fn apply_user_flows(&self, ctx: &mut Context<'_>, flows: UserFlows)
        -> Result<(), PaymentError>;

    /// Apply merged rate/balance changes to stream records.
    fn apply_stream_record_changes(
        &self,
        ctx: &mut Context<'_>,
        changes: Vec<StreamRecordChange>,
    ) -> Result<(), PaymentError>;

    /// Read a stream record.
    fn stream_record(&self, store: &dyn KvRead, addr: Address) -> Option<StreamRecord>;

    /// True if `addr` is `owner` itself or a payment account owned by it.
    fn is_payment_account_usable(&self, store: &dyn KvRead, addr: Address, owner: Address)
        -> bool;

    /// Settle `account` to now and move its positive static balance to
    /// `to`'s bank balance. Returns the amount moved. Used by virtual
    /// payment account settlement.
    fn settle_and_withdraw(
        &self,
        ctx: &mut Context<'_>,
        account: Address,
        to: Address,
    ) -> Result<u128, PaymentError>;

    /// Current governance parameters.
    fn params(&self, store: &dyn KvRead) -> PaymentParams;
}
