//! # SP Registry Events

use crate::domain::entities::StorageProvider;
use shared_store::Event;
use shared_types::SpId;

/// Emitted on registration.
pub fn create_storage_provider(sp: &StorageProvider) -> Event {
    Event::new(
        "create_storage_provider",
        vec![
            ("sp_id".to_string(), sp.id.to_string()),
            ("operator".to_string(), sp.operator.to_string()),
            ("endpoint".to_string(), sp.endpoint.clone()),
            ("deposit".to_string(), sp.deposit.to_string()),
        ],
    )
}

/// Emitted on a successful edit.
pub fn edit_storage_provider(sp: &StorageProvider) -> Event {
    Event::new(
        "edit_storage_provider",
        vec![
            ("sp_id".to_string(), sp.id.to_string()),
            ("operator".to_string(), sp.operator.to_string()),
            ("endpoint".to_string(), sp.endpoint.clone()),
        ],
    )
}

/// Emitted on deposit top-up.
pub fn sp_deposit(sp_id: SpId, amount: u128) -> Event {
    Event::new(
        "sp_deposit",
        vec![
            ("sp_id".to_string(), sp_id.to_string()),
            ("amount".to_string(), amount.to_string()),
        ],
    )
}

/// Emitted when an exit is requested.
pub fn sp_exit_requested(sp_id: SpId) -> Event {
    Event::new("sp_exit_requested", vec![("sp_id".to_string(), sp_id.to_string())])
}

/// Emitted when an exit completes and the deposit refunds.
pub fn sp_exit_completed(sp_id: SpId, refund: u128) -> Event {
    Event::new(
        "sp_exit_completed",
        vec![
            ("sp_id".to_string(), sp_id.to_string()),
            ("refund".to_string(), refund.to_string()),
        ],
    )
}

/// Emitted when the global price snapshot refreshes.
pub fn global_price_updated(update_time: i64, primary: u128, secondary: u128) -> Event {
    Event::new(
        "global_sp_store_price_updated",
        vec![
            ("update_time".to_string(), update_time.to_string()),
            ("primary_store_price".to_string(), primary.to_string()),
            ("secondary_store_price".to_string(), secondary.to_string()),
        ],
    )
}
