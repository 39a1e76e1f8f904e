//! # Block Events
//!
//! Typed events emitted by handlers, collected per message and flushed
//! into the block result on commit. A rolled-back message flushes
//! nothing.

/// A single emitted event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Event type, e.g. `"create_bucket"`.
    pub ty: String,
    /// Ordered attribute pairs.
    pub attributes: Vec<(String, String)>,
}

impl Event {
    /// Build an event from a type and attribute pairs.
    pub fn new(ty: impl Into<String>, attributes: Vec<(String, String)>) -> Self {
        Self { ty: ty.into(), attributes }
    }
}

/// Per-message event collector.
#[derive(Debug, Default)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Move all collected events out.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Absorb events from a committed child scope.
    pub fn extend(&mut self, events: Vec<Event>) {
        self.events.extend(events);
    }

    /// Read-only view.
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
