//! # SP Value Objects

use serde::{Deserialize, Serialize};

/// Storage provider lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpStatus {
    /// Serving buckets and accepting seals.
    #[default]
    InService,
    /// Jailed by challenge or governance; not placeable.
    InJailed,
    /// Exit requested; draining virtual groups.
    GracefulExiting,
    /// Forced out by governance; draining without consent.
    ForceExiting,
}

impl SpStatus {
    /// True while the SP may serve new buckets.
    pub fn is_in_service(self) -> bool {
        self == SpStatus::InService
    }

    /// True while the SP is in either exit phase.
    pub fn is_exiting(self) -> bool {
        matches!(self, SpStatus::GracefulExiting | SpStatus::ForceExiting)
    }
}

/// Which indexed address field an edit touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressField {
    /// Transaction-signing operator key.
    Operator,
    /// Deposit funding account.
    Funding,
    /// Object-seal signing key.
    Seal,
    /// Approval signing key.
    Approval,
    /// Garbage-collection key.
    Gc,
}

impl AddressField {
    /// Stable name used in errors and events.
    pub fn name(self) -> &'static str {
        match self {
            AddressField::Operator => "operator",
            AddressField::Funding => "funding",
            AddressField::Seal => "seal",
            AddressField::Approval => "approval",
            AddressField::Gc => "gc",
        }
    }
}
