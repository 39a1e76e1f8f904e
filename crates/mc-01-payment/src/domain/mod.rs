//! Payment domain: entities, value objects, pure flow algebra,
//! invariants and errors.

pub mod entities;
pub mod errors;
pub mod flows;
pub mod invariants;
pub mod value_objects;
