//! # SP Registry Ports
//!
//! Inbound port consumed by the storage and virtual-group engines.

use crate::domain::entities::{GlobalSpStorePrice, SpParams, StorageProvider};
use crate::domain::errors::SpError;
use shared_store::{Context, KvRead};
use shared_types::{Address, SpId};

/// Registry reads plus the status transitions other modules drive.
pub trait SpApi: Send + Sync {
    /// SP by registry id.
    fn sp_by_id(&self, store: &dyn KvRead, id: SpId) -> Option<StorageProvider>;

    /// SP by operator address.
    fn sp_by_operator(&self, store: &dyn KvRead, addr: Address) -> Option<StorageProvider>;

    /// Global price snapshot effective at `time` (greatest update_time ≤ time).
    fn global_price_at(&self, store: &dyn KvRead, time: i64) -> Option<GlobalSpStorePrice>;

    /// Current params.
    fn params(&self, store: &dyn KvRead) -> SpParams;

    /// Move an SP into `GRACEFUL_EXITING`.
    fn begin_exit(&self, ctx: &mut Context<'_>, sp_id: SpId) -> Result<(), SpError>;

    /// Finish an exit after the virtual-group engine drained the SP;
    /// refunds the deposit to the funding address.
    fn complete_exit(&self, ctx: &mut Context<'_>, sp_id: SpId) -> Result<(), SpError>;
}
