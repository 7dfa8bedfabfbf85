//! Bounded energy accumulator with per-tick transfer caps.
//!
//! Two pairs of operations exist on purpose:
//!
//! - [`EnergyBuffer::try_add`] / [`EnergyBuffer::try_remove`] are the
//!   *external* transfer path (cables, adjacent storage). They clamp to the
//!   per-tick rate caps and to the stored/headroom bounds, and report the
//!   delta actually applied.
//! - [`EnergyBuffer::fill`] / [`EnergyBuffer::consume`] are the *internal*
//!   path used by the machine's own crafting process. Self-generation is not
//!   rate-capped (overflow beyond capacity is wasted), and craft costs are
//!   drawn all-or-nothing.
//!
//! `stored` never leaves `[0, capacity]`; every operation clamps before
//! mutating, never after.

use crate::fixed::Fixed64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyBuffer {
    stored: Fixed64,
    capacity: Fixed64,
    /// Maximum externally-inserted energy per tick.
    max_input: Fixed64,
    /// Maximum externally-extracted energy per tick.
    max_output: Fixed64,
}

impl EnergyBuffer {
    pub fn new(capacity: Fixed64, max_input: Fixed64, max_output: Fixed64) -> Self {
        Self {
            stored: Fixed64::ZERO,
            capacity: capacity.max(Fixed64::ZERO),
            max_input: max_input.max(Fixed64::ZERO),
            max_output: max_output.max(Fixed64::ZERO),
        }
    }

    /// Insert energy from outside. Clamped to `min(max_input, headroom)`;
    /// returns the amount actually applied (never negative).
    pub fn try_add(&mut self, amount: Fixed64) -> Fixed64 {
        let headroom = self.capacity - self.stored;
        let applied = amount.min(self.max_input).min(headroom).max(Fixed64::ZERO);
        self.stored += applied;
        applied
    }

    /// Extract energy from outside. Clamped to `min(max_output, stored)`;
    /// returns the amount actually applied (never negative).
    pub fn try_remove(&mut self, amount: Fixed64) -> Fixed64 {
        let applied = amount.min(self.max_output).min(self.stored).max(Fixed64::ZERO);
        self.stored -= applied;
        applied
    }

    pub fn can_supply(&self, amount: Fixed64) -> bool {
        self.stored >= amount
    }

    /// Self-generation: add up to `amount`, bounded only by capacity.
    /// Returns the overflow that was wasted.
    pub fn fill(&mut self, amount: Fixed64) -> Fixed64 {
        let headroom = self.capacity - self.stored;
        let applied = amount.min(headroom).max(Fixed64::ZERO);
        self.stored += applied;
        (amount - applied).max(Fixed64::ZERO)
    }

    /// Draw an exact amount for a craft cost. All-or-nothing: returns false
    /// and leaves the buffer untouched if `stored < amount`.
    pub fn consume(&mut self, amount: Fixed64) -> bool {
        if amount < Fixed64::ZERO || !self.can_supply(amount) {
            return false;
        }
        self.stored -= amount;
        true
    }

    pub fn stored(&self) -> Fixed64 {
        self.stored
    }

    pub fn capacity(&self) -> Fixed64 {
        self.capacity
    }

    pub fn max_input(&self) -> Fixed64 {
        self.max_input
    }

    pub fn max_output(&self) -> Fixed64 {
        self.max_output
    }

    /// Fill level in `[0, 1]` for telemetry.
    pub fn fill_ratio(&self) -> Fixed64 {
        if self.capacity == Fixed64::ZERO {
            Fixed64::ZERO
        } else {
            self.stored / self.capacity
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64 as fixed;
    use proptest::prelude::*;

    fn buffer(capacity: f64, max_in: f64, max_out: f64) -> EnergyBuffer {
        EnergyBuffer::new(fixed(capacity), fixed(max_in), fixed(max_out))
    }

    // -----------------------------------------------------------------------
    // Rate caps and clamping
    // -----------------------------------------------------------------------

    #[test]
    fn add_is_rate_capped() {
        // capacity=1000, max_input=100: two adds of 150 apply 100 each.
        let mut b = buffer(1000.0, 100.0, 100.0);
        assert_eq!(b.try_add(fixed(150.0)), fixed(100.0));
        assert_eq!(b.stored(), fixed(100.0));
        assert_eq!(b.try_add(fixed(150.0)), fixed(100.0));
        assert_eq!(b.stored(), fixed(200.0));
    }

    #[test]
    fn add_is_headroom_capped() {
        let mut b = buffer(50.0, 100.0, 100.0);
        assert_eq!(b.try_add(fixed(80.0)), fixed(50.0));
        assert_eq!(b.try_add(fixed(80.0)), fixed(0.0));
        assert_eq!(b.stored(), fixed(50.0));
    }

    #[test]
    fn remove_is_rate_and_stored_capped() {
        let mut b = buffer(1000.0, 1000.0, 40.0);
        b.try_add(fixed(100.0));
        assert_eq!(b.try_remove(fixed(100.0)), fixed(40.0));
        assert_eq!(b.stored(), fixed(60.0));
        // Drain the rest in rate-capped steps.
        assert_eq!(b.try_remove(fixed(100.0)), fixed(40.0));
        assert_eq!(b.try_remove(fixed(100.0)), fixed(20.0));
        assert_eq!(b.stored(), fixed(0.0));
    }

    #[test]
    fn negative_requests_apply_nothing() {
        let mut b = buffer(100.0, 10.0, 10.0);
        b.try_add(fixed(10.0));
        assert_eq!(b.try_add(fixed(-5.0)), fixed(0.0));
        assert_eq!(b.try_remove(fixed(-5.0)), fixed(0.0));
        assert_eq!(b.stored(), fixed(10.0));
    }

    // -----------------------------------------------------------------------
    // Internal path
    // -----------------------------------------------------------------------

    #[test]
    fn fill_bypasses_input_rate_and_wastes_overflow() {
        let mut b = buffer(100.0, 10.0, 10.0);
        assert_eq!(b.fill(fixed(80.0)), fixed(0.0));
        assert_eq!(b.stored(), fixed(80.0));
        // 30 more only fits 20; 10 is wasted.
        assert_eq!(b.fill(fixed(30.0)), fixed(10.0));
        assert_eq!(b.stored(), fixed(100.0));
    }

    #[test]
    fn consume_is_all_or_nothing() {
        let mut b = buffer(100.0, 100.0, 1.0);
        b.try_add(fixed(20.0));
        assert!(!b.consume(fixed(25.0)));
        assert_eq!(b.stored(), fixed(20.0));
        assert!(b.consume(fixed(20.0)));
        assert_eq!(b.stored(), fixed(0.0));
    }

    #[test]
    fn can_supply_boundary() {
        let mut b = buffer(100.0, 100.0, 100.0);
        b.try_add(fixed(20.0));
        assert!(b.can_supply(fixed(20.0)));
        assert!(!b.can_supply(fixed(20.5)));
    }

    #[test]
    fn fill_ratio() {
        let mut b = buffer(200.0, 200.0, 200.0);
        b.try_add(fixed(50.0));
        assert_eq!(b.fill_ratio(), fixed(0.25));
        assert_eq!(buffer(0.0, 1.0, 1.0).fill_ratio(), fixed(0.0));
    }

    // -----------------------------------------------------------------------
    // Property: stored never leaves [0, capacity]
    // -----------------------------------------------------------------------

    proptest! {
        #[test]
        fn stored_stays_in_bounds(ops in prop::collection::vec((0u8..4, -500.0f64..500.0), 0..64)) {
            let mut b = buffer(250.0, 40.0, 35.0);
            for (op, amount) in ops {
                let amount = fixed(amount);
                match op {
                    0 => { b.try_add(amount); }
                    1 => { b.try_remove(amount); }
                    2 => { b.fill(amount); }
                    _ => { b.consume(amount); }
                }
                prop_assert!(b.stored() >= Fixed64::ZERO);
                prop_assert!(b.stored() <= b.capacity());
            }
        }

        #[test]
        fn applied_delta_is_exact(amount in 0.0f64..500.0) {
            let mut b = buffer(250.0, 40.0, 35.0);
            let before = b.stored();
            let applied = b.try_add(fixed(amount));
            prop_assert_eq!(b.stored() - before, applied);
        }
    }
}
