//! # Gas Meter
//!
//! The per-message deadline. Exhaustion aborts the current message; the
//! cache-context rollback discards its partial writes.

use crate::errors::StoreError;

/// Monotonic gas meter with a hard limit.
#[derive(Clone, Debug)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    /// Meter with an explicit limit.
    pub fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Meter that never runs out (block-internal system work).
    pub fn infinite() -> Self {
        Self { limit: u64::MAX, consumed: 0 }
    }

    /// Charge `amount` gas.
    pub fn consume(&mut self, amount: u64) -> Result<(), StoreError> {
        let next = self.consumed.saturating_add(amount);
        if next > self.limit {
            self.consumed = self.limit;
            return Err(StoreError::OutOfGas { consumed: next, limit: self.limit });
        }
        self.consumed = next;
        Ok(())
    }

    /// Gas consumed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Gas limit.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Remaining gas.
    pub fn remaining(&self) -> u64 {
        self.limit - self.consumed
    }

    /// Overwrite the consumed counter (scoped-context copy-back).
    pub fn set_consumed(&mut self, consumed: u64) {
        self.consumed = consumed.min(self.limit);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_until_exhausted() {
        let mut meter = GasMeter::new(100);
        assert!(meter.consume(60).is_ok());
        assert!(meter.consume(40).is_ok());
        assert!(matches!(meter.consume(1), Err(StoreError::OutOfGas { .. })));
        assert_eq!(meter.consumed(), 100);
    }

    #[test]
    fn test_infinite_meter() {
        let mut meter = GasMeter::infinite();
        assert!(meter.consume(u64::MAX / 2).is_ok());
        assert!(meter.consume(u64::MAX / 2).is_ok());
    }
}
