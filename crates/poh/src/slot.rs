//! Slot numbers derived from chain progress.

use crate::error::{PohError, Result};

/// Maps sequence numbers to wrapping slot numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotClock {
    hashes_per_slot: u64,
    max_slots: u64,
}

impl SlotClock {
    /// Both arguments must be non-zero.
    pub fn new(hashes_per_slot: u64, max_slots: u64) -> Result<Self> {
        if hashes_per_slot == 0 || max_slots == 0 {
            return Err(PohError::InvalidConfig(format!(
                "slot clock needs non-zero hashes_per_slot and max_slots, got {hashes_per_slot} and {max_slots}"
            )));
        }
        Ok(Self {
            hashes_per_slot,
            max_slots,
        })
    }

    /// Slot count since genesis, before wrapping.
    pub fn absolute_slot(&self, sequence: u64) -> u64 {
        sequence / self.hashes_per_slot
    }

    /// `(sequence / hashes_per_slot) mod max_slots`
    pub fn slot_for(&self, sequence: u64) -> u64 {
        self.absolute_slot(sequence) % self.max_slots
    }

    /// True when moving from `previous` to `current` enters a new slot.
    ///
    /// Compares unwrapped slot counts so a single boundary fires once even
    /// when the wrapped slot number repeats.
    pub fn crossed_boundary(&self, previous: u64, current: u64) -> bool {
        self.absolute_slot(current) > self.absolute_slot(previous)
    }
}
