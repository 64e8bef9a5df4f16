//! Sequencer configuration with construction-time validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PohError, Result};

/// Default ring capacity (hashes retained for verification).
pub const DEFAULT_CAPACITY: usize = 10_240;
/// Default size of the wrapping slot window.
pub const DEFAULT_MAX_SLOTS: u64 = 512;
/// Default hashes per slot (`DEFAULT_CAPACITY / DEFAULT_MAX_SLOTS`).
pub const DEFAULT_HASHES_PER_SLOT: u64 = 20;
/// Default bound on outstanding lockouts.
pub const DEFAULT_MAX_TIMEOUT_SLOTS: usize = DEFAULT_MAX_SLOTS as usize;
/// Default pacing target for one slot.
pub const DEFAULT_SLOT_DURATION_MS: u64 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Number of hashes kept in the ring buffer.
    pub capacity: usize,
    /// Chain steps that make up one slot.
    pub hashes_per_slot: u64,
    /// Slot numbers wrap modulo this value.
    pub max_slots: u64,
    /// Maximum number of outstanding lockout entries.
    pub max_timeout_slots: usize,
    /// Pacing target per slot; `0` runs uncapped.
    pub target_slot_duration_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            hashes_per_slot: DEFAULT_HASHES_PER_SLOT,
            max_slots: DEFAULT_MAX_SLOTS,
            max_timeout_slots: DEFAULT_MAX_TIMEOUT_SLOTS,
            target_slot_duration_ms: DEFAULT_SLOT_DURATION_MS,
        }
    }
}

impl SequencerConfig {
    /// Derive `hashes_per_slot` from a ring capacity spread over `max_slots`.
    ///
    /// Fails unless `capacity` divides evenly into `max_slots` slots.
    pub fn from_slot_window(capacity: usize, max_slots: u64) -> Result<Self> {
        if max_slots == 0 {
            return Err(PohError::InvalidConfig(
                "max_slots must be greater than zero".to_string(),
            ));
        }
        if capacity as u64 % max_slots != 0 {
            return Err(PohError::InvalidConfig(format!(
                "capacity {capacity} is not divisible by max_slots {max_slots}"
            )));
        }
        let config = Self {
            capacity,
            hashes_per_slot: capacity as u64 / max_slots,
            max_slots,
            max_timeout_slots: max_slots as usize,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Disable pacing so the generator runs as fast as possible.
    pub fn uncapped(mut self) -> Self {
        self.target_slot_duration_ms = 0;
        self
    }

    /// Slot pacing target, or `None` when uncapped.
    pub fn target_slot_duration(&self) -> Option<Duration> {
        match self.target_slot_duration_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity < 2 {
            return Err(PohError::InvalidConfig(format!(
                "capacity must be at least 2, got {}",
                self.capacity
            )));
        }
        if self.hashes_per_slot == 0 {
            return Err(PohError::InvalidConfig(
                "hashes_per_slot must be greater than zero".to_string(),
            ));
        }
        if self.max_slots == 0 {
            return Err(PohError::InvalidConfig(
                "max_slots must be greater than zero".to_string(),
            ));
        }
        if self.max_timeout_slots == 0 {
            return Err(PohError::InvalidConfig(
                "max_timeout_slots must be greater than zero".to_string(),
            ));
        }
        if self.capacity as u64 % self.hashes_per_slot != 0 {
            return Err(PohError::InvalidConfig(format!(
                "capacity {} is not divisible by hashes_per_slot {}",
                self.capacity, self.hashes_per_slot
            )));
        }
        Ok(())
    }
}
