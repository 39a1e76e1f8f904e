//! # Payment Events

use crate::domain::entities::StreamRecord;
use shared_store::Event;
use shared_types::Address;

/// Emitted after any stream record save.
pub fn stream_record_update(record: &StreamRecord) -> Event {
    Event::new(
        "update_stream_record",
        vec![
            ("account".to_string(), record.account.to_string()),
            ("netflow_rate".to_string(), record.netflow_rate.to_string()),
            ("static_balance".to_string(), record.static_balance.to_string()),
            ("buffer_balance".to_string(), record.buffer_balance.to_string()),
            ("status".to_string(), format!("{:?}", record.status)),
        ],
    )
}

/// Emitted on deposit.
pub fn deposit(from: Address, to: Address, amount: u128) -> Event {
    Event::new(
        "deposit",
        vec![
            ("from".to_string(), from.to_string()),
            ("to".to_string(), to.to_string()),
            ("amount".to_string(), amount.to_string()),
        ],
    )
}

/// Emitted on withdrawal.
pub fn withdraw(account: Address, owner: Address, amount: u128) -> Event {
    Event::new(
        "withdraw",
        vec![
            ("account".to_string(), account.to_string()),
            ("owner".to_string(), owner.to_string()),
            ("amount".to_string(), amount.to_string()),
        ],
    )
}

/// Emitted when auto-settle freezes an exhausted account.
pub fn force_settle(account: Address) -> Event {
    Event::new("force_settle", vec![("account".to_string(), account.to_string())])
}

/// Emitted when a frozen account resumes.
pub fn resume(account: Address) -> Event {
    Event::new("resume_stream_record", vec![("account".to_string(), account.to_string())])
}

/// Emitted when a payment account is created.
pub fn payment_account_created(addr: Address, owner: Address) -> Event {
    Event::new(
        "create_payment_account",
        vec![
            ("addr".to_string(), addr.to_string()),
            ("owner".to_string(), owner.to_string()),
        ],
    )
}
