//! The sequencer ties the delay function, ring, slot clock and lockout
//! tracker into one consistent state machine.
//!
//! Every `step` advances all of them together: a new hash, the next
//! sequence number, its ring entry, the slot it falls in, and (on a slot
//! boundary) the lockout schedule. Callers must serialize access; see
//! [`crate::service::PohService`] for the shared, concurrent wrapper.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::SequencerConfig;
use crate::delay::{DelayState, STATE_BYTES};
use crate::error::{Result, VerifyError};
use crate::lockout::LockoutTracker;
use crate::ring::HashRing;
use crate::slot::SlotClock;
use crate::telemetry;
use crate::verifier;

/// Outcome of a single chain step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub sequence: u64,
    pub hash: DelayState,
    pub slot: u64,
    /// True when this step entered a new slot.
    pub slot_changed: bool,
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    config: SequencerConfig,
    state: DelayState,
    sequence: u64,
    slot: u64,
    ring: HashRing,
    clock: SlotClock,
    lockouts: LockoutTracker,
}

impl Sequencer {
    /// Build a sequencer at sequence 0 with `seed` stored as the first entry.
    pub fn new(seed: DelayState, config: SequencerConfig) -> Result<Self> {
        config.validate()?;

        let mut ring = HashRing::new(config.capacity)?;
        ring.insert(0, seed, seed, None);

        Ok(Self {
            clock: SlotClock::new(config.hashes_per_slot, config.max_slots)?,
            lockouts: LockoutTracker::new(config.max_timeout_slots),
            state: seed,
            sequence: 0,
            slot: 0,
            ring,
            config,
        })
    }

    /// Advance the chain by one hash.
    pub fn step(&mut self) -> Tick {
        let previous = self.state;
        self.state.advance();
        self.commit(previous, None)
    }

    /// Record an external 32-byte event as the next chain step.
    pub fn mix_in(&mut self, payload: &[u8; STATE_BYTES]) -> Tick {
        let previous = self.state;
        self.state.mix_in(payload);
        self.commit(previous, Some(*payload))
    }

    fn commit(&mut self, previous: DelayState, mixin: Option<[u8; STATE_BYTES]>) -> Tick {
        let prior_sequence = self.sequence;
        self.sequence += 1;
        self.ring.insert(self.sequence, self.state, previous, mixin);
        self.slot = self.clock.slot_for(self.sequence);

        let slot_changed = self.clock.crossed_boundary(prior_sequence, self.sequence);
        if slot_changed {
            self.lockouts.on_slot_boundary();
            debug!(
                slot = self.slot,
                hash = %self.state,
                timeouts = ?self.lockouts.lockouts(),
                "PoH slot transition"
            );
            telemetry::record_slot(self.sequence, self.slot, self.lockouts.len());
        } else {
            trace!(sequence = self.sequence, hash = %self.state, "PoH tick");
        }

        Tick {
            sequence: self.sequence,
            hash: self.state,
            slot: self.slot,
            slot_changed,
        }
    }

    /// Run `n` steps, returning the last tick (or `None` for `n == 0`).
    pub fn step_n(&mut self, n: u64) -> Option<Tick> {
        let mut last = None;
        for _ in 0..n {
            last = Some(self.step());
        }
        last
    }

    /// Boolean verification boundary: true exactly once per valid sequence.
    pub fn verify(&mut self, sequence: u64) -> bool {
        self.verify_detailed(sequence).is_ok()
    }

    /// Verify `sequence`, reporting why it failed.
    pub fn verify_detailed(&mut self, sequence: u64) -> std::result::Result<(), VerifyError> {
        let result = verifier::verify(&mut self.ring, sequence);
        telemetry::record_verification(&result);
        result
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn last_hash(&self) -> DelayState {
        self.state
    }

    /// Outstanding lockouts, newest vote first.
    pub fn lockouts(&self) -> Vec<u64> {
        self.lockouts.lockouts()
    }

    /// Stored, unconsumed hash for `sequence`, if still in the window.
    pub fn hash_at(&self, sequence: u64) -> Option<DelayState> {
        self.ring.get(sequence).map(|entry| entry.hash)
    }

    pub fn live_entries(&self) -> usize {
        self.ring.live_len()
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }
}
