//! # Payment Service
//!
//! Stream-record state machine. All mutation funnels through
//! `store_record`, which also maintains the auto-settle queue keyed by
//! each payer's projected exhaustion deadline.

use crate::domain::entities::{OutFlow, PaymentAccount, PaymentParams, StreamRecord};
use crate::domain::errors::PaymentError;
use crate::domain::flows::{merge_outflows, merge_stream_record_changes};
use crate::domain::value_objects::{OutFlowStatus, StreamRecordChange, StreamStatus, UserFlows};
use crate::events;
use crate::keys;
use crate::ports::PaymentApi;
use shared_store::bank::BankApi;
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{derive_address, module_address, Address, Coin, Uint};
use std::sync::Arc;
use tracing::debug;

/// Escrow account holding all streamed funds.
pub fn payment_module_address() -> Address {
    module_address("payment")
}

/// The stream payment engine.
pub struct PaymentService {
    bank: Arc<dyn BankApi>,
}

impl PaymentService {
    /// Build over a bank port.
    pub fn new(bank: Arc<dyn BankApi>) -> Self {
        Self { bank }
    }

    /// Current governance params (defaults before genesis writes them).
    pub fn get_params(&self, store: &dyn KvRead) -> PaymentParams {
        get_obj(store, &keys::params_key()).unwrap_or_default()
    }

    /// Overwrite governance params.
    pub fn set_params(&self, store: &mut dyn KvWrite, params: &PaymentParams) {
        put_obj(store, keys::params_key(), params);
    }

    /// Load a stream record.
    pub fn get_stream_record(&self, store: &dyn KvRead, addr: Address) -> Option<StreamRecord> {
        get_obj(store, &keys::stream_record_key(addr))
    }

    // =========================================================================
    // SETTLEMENT PRIMITIVES
    // =========================================================================

    /// Accrue the netflow since the last settlement into the static
    /// balance, drawing from the buffer if it dips negative.
    fn settle(record: &mut StreamRecord, now: i64) {
        if now > record.settle_timestamp {
            let delta = (now - record.settle_timestamp) as i128;
            record.static_balance += record.netflow_rate * delta;
            if record.static_balance < 0 {
                let draw = record.buffer_balance.min((-record.static_balance) as u128);
                record.buffer_balance -= draw;
                record.static_balance += draw as i128;
            }
        }
        record.settle_timestamp = now;
    }

    /// Projected exhaustion deadline; only paying, active records have one.
    fn deadline(record: &StreamRecord) -> Option<i64> {
        if record.status != StreamStatus::Active || record.netflow_rate >= 0 {
            return None;
        }
        let payable = record.total_balance().max(0) / -record.netflow_rate;
        Some(record.settle_timestamp.saturating_add(payable as i64))
    }

    /// Persist a record, fix its auto-settle queue entry, emit the event.
    fn store_record(&self, ctx: &mut Context<'_>, old: Option<&StreamRecord>, record: &StreamRecord) {
        if let Some(old) = old {
            if let Some(deadline) = Self::deadline(old) {
                ctx.store.delete(&keys::auto_settle_key(deadline, old.account));
            }
        }
        if let Some(deadline) = Self::deadline(record) {
            ctx.store.set(keys::auto_settle_key(deadline, record.account), Vec::new());
        }
        put_obj(&mut ctx.store, keys::stream_record_key(record.account), record);
        ctx.events.emit(events::stream_record_update(record));
    }

    /// Top the buffer up to `|netflow| · reserve_time`, pulling any static
    /// deficit from the payer's bank balance.
    fn rebalance_buffer(
        &self,
        ctx: &mut Context<'_>,
        record: &mut StreamRecord,
        params: &PaymentParams,
    ) -> Result<(), PaymentError> {
        let required = if record.netflow_rate < 0 {
            (-record.netflow_rate) as u128 * params.reserve_time as u128
        } else {
            0
        };
        if required >= record.buffer_balance {
            let need = required - record.buffer_balance;
            record.buffer_balance = required;
            record.static_balance -= need as i128;
        } else {
            let release = record.buffer_balance - required;
            record.buffer_balance = required;
            record.static_balance += release as i128;
        }
        if record.static_balance < 0 {
            let shortfall = (-record.static_balance) as u128;
            let coin = Coin::new(params.fee_denom.clone(), Uint::from(shortfall));
            self.bank
                .transfer(&mut ctx.store, record.account, payment_module_address(), &coin)
                .map_err(|_| PaymentError::BalanceNotEnough {
                    account: record.account,
                    shortfall,
                })?;
            record.static_balance = 0;
        }
        Ok(())
    }

    // =========================================================================
    // CHANGE APPLICATION
    // =========================================================================

    /// Apply merged rate/balance changes. Frozen records reject the
    /// mutation unless the context carries the force-update flag.
    pub fn apply_stream_record_changes(
        &self,
        ctx: &mut Context<'_>,
        changes: Vec<StreamRecordChange>,
    ) -> Result<(), PaymentError> {
        let params = self.get_params(&ctx.store);
        for change in merge_stream_record_changes(changes) {
            self.apply_one_change(ctx, change, &params)?;
        }
        Ok(())
    }

    fn apply_one_change(
        &self,
        ctx: &mut Context<'_>,
        change: StreamRecordChange,
        params: &PaymentParams,
    ) -> Result<(), PaymentError> {
        let old = self.get_stream_record(&ctx.store, change.addr);
        let mut record = old
            .clone()
            .unwrap_or_else(|| StreamRecord::new(change.addr, ctx.block.time));
        Self::settle(&mut record, ctx.block.time);

        match record.status {
            StreamStatus::Frozen => {
                if !ctx.force_update {
                    return Err(PaymentError::Frozen { account: change.addr });
                }
                record.netflow_rate += change.rate_change;
                record.static_balance += change.static_balance_change;
            }
            StreamStatus::Active => {
                record.netflow_rate += change.rate_change;
                record.static_balance += change.static_balance_change;
                self.rebalance_buffer(ctx, &mut record, params)?;
            }
        }
        self.store_record(ctx, old.as_ref(), &record);
        Ok(())
    }

    /// Apply a payer's outflow deltas. Active payers also mirror each
    /// delta onto the recipient; frozen payers (force-update flows only)
    /// adjust the frozen rate alone, recipients were already debited at
    /// freeze time.
    pub fn apply_user_flows(
        &self,
        ctx: &mut Context<'_>,
        user_flows: UserFlows,
    ) -> Result<(), PaymentError> {
        let params = self.get_params(&ctx.store);
        let flows = merge_outflows(user_flows.flows);
        if flows.is_empty() {
            return Ok(());
        }
        let from = user_flows.from;
        let old = self.get_stream_record(&ctx.store, from);
        let mut record = old.clone().unwrap_or_else(|| StreamRecord::new(from, ctx.block.time));
        Self::settle(&mut record, ctx.block.time);

        let frozen = record.status == StreamStatus::Frozen;
        if frozen && !ctx.force_update {
            return Err(PaymentError::Frozen { account: from });
        }
        let status = if frozen { OutFlowStatus::Frozen } else { OutFlowStatus::Active };

        let mut recipient_changes = Vec::new();
        let mut total_delta: i128 = 0;
        for delta in flows {
            let key = keys::out_flow_key(from, status, delta.to);
            let existing: Option<OutFlow> = get_obj(&ctx.store, &key);
            let old_rate = existing.as_ref().map(|f| f.rate).unwrap_or(0);
            let new_rate = old_rate as i128 + delta.rate;
            if new_rate < 0 {
                return Err(PaymentError::OutFlowUnderflow { from, to: delta.to });
            }
            if new_rate == 0 {
                if existing.is_some() {
                    ctx.store.delete(&key);
                    record.out_flow_count = record.out_flow_count.saturating_sub(1);
                }
            } else {
                if existing.is_none() {
                    record.out_flow_count += 1;
                }
                put_obj(
                    &mut ctx.store,
                    key,
                    &OutFlow { to: delta.to, rate: new_rate as u128, status },
                );
            }
            total_delta += delta.rate;
            if !frozen {
                recipient_changes.push(StreamRecordChange::rate(delta.to, delta.rate));
            }
        }

        if frozen {
            record.frozen_netflow_rate -= total_delta;
        } else {
            record.netflow_rate -= total_delta;
            self.rebalance_buffer(ctx, &mut record, &params)?;
        }
        self.store_record(ctx, old.as_ref(), &record);
        self.apply_stream_record_changes(ctx, recipient_changes)
    }

    // =========================================================================
    // DEPOSIT / WITHDRAW
    // =========================================================================

    /// Move bank funds into a stream record's static balance; a frozen
    /// record attempts to resume afterwards.
    pub fn deposit(
        &self,
        ctx: &mut Context<'_>,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), PaymentError> {
        let params = self.get_params(&ctx.store);
        let coin = Coin::new(params.fee_denom.clone(), Uint::from(amount));
        self.bank
            .transfer(&mut ctx.store, from, payment_module_address(), &coin)
            .map_err(|_| PaymentError::BalanceNotEnough { account: from, shortfall: amount })?;

        let old = self.get_stream_record(&ctx.store, to);
        let mut record = old.clone().unwrap_or_else(|| StreamRecord::new(to, ctx.block.time));
        Self::settle(&mut record, ctx.block.time);
        record.static_balance += amount as i128;
        ctx.events.emit(events::deposit(from, to, amount));

        if record.status == StreamStatus::Frozen {
            self.try_resume(ctx, old.as_ref(), record, &params)
        } else {
            self.store_record(ctx, old.as_ref(), &record);
            Ok(())
        }
    }

    /// Withdraw settled static balance back to the owner's bank account.
    pub fn withdraw(
        &self,
        ctx: &mut Context<'_>,
        owner: Address,
        from: Address,
        amount: u128,
    ) -> Result<(), PaymentError> {
        if from != owner {
            let account: PaymentAccount = get_obj(&ctx.store, &keys::payment_account_key(from))
                .ok_or(PaymentError::StreamRecordNotFound { account: from })?;
            if account.owner != owner || !account.refundable {
                return Err(PaymentError::NotRefundable { account: from });
            }
        }
        let old = self
            .get_stream_record(&ctx.store, from)
            .ok_or(PaymentError::StreamRecordNotFound { account: from })?;
        let mut record = old.clone();
        Self::settle(&mut record, ctx.block.time);
        if record.status != StreamStatus::Active || record.static_balance < amount as i128 {
            return Err(PaymentError::InsufficientStaticBalance { account: from });
        }
        record.static_balance -= amount as i128;
        let params = self.get_params(&ctx.store);
        let coin = Coin::new(params.fee_denom.clone(), Uint::from(amount));
        self.bank
            .transfer(&mut ctx.store, payment_module_address(), owner, &coin)
            .unwrap_or_else(|e| panic!("payment escrow underfunded: {e}"));
        self.store_record(ctx, Some(&old), &record);
        ctx.events.emit(events::withdraw(from, owner, amount));
        Ok(())
    }

    // =========================================================================
    // PAYMENT ACCOUNTS
    // =========================================================================

    /// Create a payment account under `owner`.
    pub fn create_payment_account(
        &self,
        ctx: &mut Context<'_>,
        owner: Address,
    ) -> Result<Address, PaymentError> {
        let params = self.get_params(&ctx.store);
        let count_key = keys::payment_account_count_key(owner);
        let count: u64 = get_obj(&ctx.store, &count_key).unwrap_or(0);
        if count >= params.payment_account_count_limit {
            return Err(PaymentError::PaymentAccountLimit {
                current: count,
                limit: params.payment_account_count_limit,
            });
        }
        let addr =
            derive_address("payment-account", &[owner.as_bytes(), &count.to_be_bytes()]);
        put_obj(
            &mut ctx.store,
            keys::payment_account_key(addr),
            &PaymentAccount { addr, owner, refundable: true },
        );
        put_obj(&mut ctx.store, count_key, &(count + 1));
        ctx.events.emit(events::payment_account_created(addr, owner));
        Ok(addr)
    }

    /// Permanently disable owner withdrawals from a payment account.
    pub fn disable_refund(
        &self,
        ctx: &mut Context<'_>,
        owner: Address,
        addr: Address,
    ) -> Result<(), PaymentError> {
        let key = keys::payment_account_key(addr);
        let mut account: PaymentAccount = get_obj(&ctx.store, &key)
            .ok_or(PaymentError::StreamRecordNotFound { account: addr })?;
        if account.owner != owner {
            return Err(PaymentError::NotRefundable { account: addr });
        }
        account.refundable = false;
        put_obj(&mut ctx.store, key, &account);
        Ok(())
    }

    // =========================================================================
    // AUTO SETTLE / RESUME
    // =========================================================================

    /// Epoch pass over the auto-settle queue. Exhausted payers freeze:
    /// each active outflow moves to the frozen set and its rate is
    /// subtracted from the recipient.
    pub fn auto_settle(&self, ctx: &mut Context<'_>) {
        let params = self.get_params(&ctx.store);
        let entries = ctx.store.scan_prefix(&keys::auto_settle_prefix());
        let mut processed: u64 = 0;
        for (key, _) in entries {
            let ts = i64::from_be_bytes(
                key[2..10].try_into().unwrap_or_else(|_| panic!("malformed settle key")),
            );
            if ts > ctx.block.time {
                break;
            }
            let addr = Address::from_slice(&key[10..30])
                .unwrap_or_else(|| panic!("malformed settle key address"));
            ctx.store.delete(&key);

            let Some(old) = self.get_stream_record(&ctx.store, addr) else {
                continue; // stale queue entry
            };
            let mut record = old.clone();
            Self::settle(&mut record, ctx.block.time);

            if record.netflow_rate < 0 && record.total_balance() <= 0 {
                processed += self.freeze(ctx, &old, record);
            } else {
                self.store_record(ctx, Some(&old), &record);
            }
            if processed >= params.max_auto_settle_flow_count {
                break;
            }
        }
    }

    fn freeze(&self, ctx: &mut Context<'_>, old: &StreamRecord, mut record: StreamRecord) -> u64 {
        debug!(account = %record.account, "freezing exhausted stream record");
        let from = record.account;
        let actives = ctx
            .store
            .scan_prefix(&keys::out_flow_status_prefix(from, OutFlowStatus::Active));
        let mut recipient_changes = Vec::new();
        let mut moved: u64 = 0;
        for (key, bytes) in actives {
            let flow: OutFlow = bincode::deserialize(&bytes)
                .unwrap_or_else(|e| panic!("corrupt outflow record: {e}"));
            ctx.store.delete(&key);
            put_obj(
                &mut ctx.store,
                keys::out_flow_key(from, OutFlowStatus::Frozen, flow.to),
                &OutFlow { status: OutFlowStatus::Frozen, ..flow },
            );
            recipient_changes.push(StreamRecordChange::rate(flow.to, -(flow.rate as i128)));
            moved += 1;
        }
        record.frozen_netflow_rate += record.netflow_rate;
        record.netflow_rate = 0;
        record.status = StreamStatus::Frozen;
        record.static_balance += record.buffer_balance as i128;
        record.buffer_balance = 0;
        self.store_record(ctx, Some(old), &record);
        ctx.events.emit(events::force_settle(from));

        self.force_apply(ctx, recipient_changes);
        moved
    }

    /// Resume a frozen record if the deposit now covers the reserve.
    /// Frozen outflows replay in recipient order (their keys sort by
    /// to-address).
    fn try_resume(
        &self,
        ctx: &mut Context<'_>,
        old: Option<&StreamRecord>,
        mut record: StreamRecord,
        params: &PaymentParams,
    ) -> Result<(), PaymentError> {
        let reserve_needed =
            (-record.frozen_netflow_rate).max(0) as u128 * params.reserve_time as u128;
        if record.static_balance < reserve_needed as i128 {
            self.store_record(ctx, old, &record);
            return Ok(());
        }
        let from = record.account;
        let frozen_flows = ctx
            .store
            .scan_prefix(&keys::out_flow_status_prefix(from, OutFlowStatus::Frozen));
        let mut recipient_changes = Vec::new();
        for (key, bytes) in frozen_flows {
            let flow: OutFlow = bincode::deserialize(&bytes)
                .unwrap_or_else(|e| panic!("corrupt outflow record: {e}"));
            ctx.store.delete(&key);
            put_obj(
                &mut ctx.store,
                keys::out_flow_key(from, OutFlowStatus::Active, flow.to),
                &OutFlow { status: OutFlowStatus::Active, ..flow },
            );
            recipient_changes.push(StreamRecordChange::rate(flow.to, flow.rate as i128));
        }
        record.netflow_rate += record.frozen_netflow_rate;
        record.frozen_netflow_rate = 0;
        record.status = StreamStatus::Active;
        self.rebalance_buffer(ctx, &mut record, params)?;
        self.store_record(ctx, old, &record);
        ctx.events.emit(events::resume(from));

        self.force_apply(ctx, recipient_changes);
        Ok(())
    }

    /// Apply system-driven changes with the force flag raised, restoring
    /// the caller's flag afterwards.
    fn force_apply(&self, ctx: &mut Context<'_>, changes: Vec<StreamRecordChange>) {
        let prev = ctx.force_update;
        ctx.force_update = true;
        let result = self.apply_stream_record_changes(ctx, changes);
        ctx.force_update = prev;
        result.unwrap_or_else(|e| panic!("forced stream change failed: {e}"));
    }
}

impl PaymentApi for PaymentService {
    fn apply_user_flows(
        &self,
        ctx: &mut Context<'_>,
        flows: UserFlows,
    ) -> Result<(), PaymentError> {
        PaymentService::apply_user_flows(self, ctx, flows)
    }

    fn apply_stream_record_changes(
        &self,
        ctx: &mut Context<'_>,
        changes: Vec<StreamRecordChange>,
    ) -> Result<(), PaymentError> {
        PaymentService::apply_stream_record_changes(self, ctx, changes)
    }

    fn stream_record(&self, store: &dyn KvRead, addr: Address) -> Option<StreamRecord> {
        self.get_stream_record(store, addr)
    }

    fn settle_and_withdraw(
        &self,
        ctx: &mut Context<'_>,
        account: Address,
        to: Address,
    ) -> Result<u128, PaymentError> {
        let old = self
            .get_stream_record(&ctx.store, account)
            .ok_or(PaymentError::StreamRecordNotFound { account })?;
        let mut record = old.clone();
        Self::settle(&mut record, ctx.block.time);
        if record.static_balance <= 0 {
            self.store_record(ctx, Some(&old), &record);
            return Ok(0);
        }
        let amount = record.static_balance as u128;
        record.static_balance = 0;
        let params = self.get_params(&ctx.store);
        let coin = Coin::new(params.fee_denom.clone(), Uint::from(amount));
        self.bank
            .transfer(&mut ctx.store, payment_module_address(), to, &coin)
            .unwrap_or_else(|e| panic!("payment escrow underfunded: {e}"));
        self.store_record(ctx, Some(&old), &record);
        ctx.events.emit(events::withdraw(account, to, amount));
        Ok(amount)
    }

    fn is_payment_account_usable(
        &self,
        store: &dyn KvRead,
        addr: Address,
        owner: Address,
    ) -> bool {
        if addr == owner {
            return true;
        }
        get_obj::<PaymentAccount>(store, &keys::payment_account_key(addr))
            .map(|account| account.owner == owner)
            .unwrap_or(false)
    }

    fn params(&self, store: &dyn KvRead) -> PaymentParams {
        self.get_params(store)
    }
}

// =============================================================================
// TESTS
// =============================================================================
