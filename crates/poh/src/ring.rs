//! Fixed-capacity ring of recently produced hashes.
//!
//! Sequence `s` lives at index `s % capacity` until sequence `s + capacity`
//! overwrites it. Each entry remembers which sequence wrote it, so lookups
//! for an overwritten sequence miss instead of returning a newer hash, and
//! the hash it was derived from, so the oldest live entry stays verifiable
//! after its predecessor has been overwritten.

use crate::delay::{DelayState, STATE_BYTES};
use crate::error::{PohError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingEntry {
    pub sequence: u64,
    pub hash: DelayState,
    /// Hash stored at `sequence - 1` when this entry was produced.
    pub previous: DelayState,
    /// Payload mixed in at this step, if any.
    pub mixin: Option<[u8; STATE_BYTES]>,
    /// Set once the entry has been verified.
    pub consumed: bool,
}

#[derive(Debug, Clone)]
pub struct HashRing {
    entries: Vec<Option<RingEntry>>,
}

impl HashRing {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PohError::InvalidConfig(
                "ring capacity must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            entries: vec![None; capacity],
        })
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    fn index(&self, sequence: u64) -> usize {
        (sequence % self.entries.len() as u64) as usize
    }

    /// Store `hash` for `sequence`, replacing whatever occupied the index.
    pub fn insert(
        &mut self,
        sequence: u64,
        hash: DelayState,
        previous: DelayState,
        mixin: Option<[u8; STATE_BYTES]>,
    ) {
        let idx = self.index(sequence);
        self.entries[idx] = Some(RingEntry {
            sequence,
            hash,
            previous,
            mixin,
            consumed: false,
        });
    }

    /// Live, unconsumed entry for a positive `sequence`.
    pub fn get(&self, sequence: u64) -> Option<&RingEntry> {
        if sequence == 0 {
            return None;
        }
        self.link(sequence).filter(|entry| !entry.consumed)
    }

    /// Entry for `sequence` regardless of consumption, including the seed at
    /// sequence 0. Used to check chain continuity during verification.
    pub fn link(&self, sequence: u64) -> Option<&RingEntry> {
        self.entries[self.index(sequence)]
            .as_ref()
            .filter(|entry| entry.sequence == sequence)
    }

    /// Mark `sequence` as consumed. Returns false if it was not live.
    pub fn tombstone(&mut self, sequence: u64) -> bool {
        let idx = self.index(sequence);
        match self.entries[idx].as_mut() {
            Some(entry) if entry.sequence == sequence && !entry.consumed => {
                entry.consumed = true;
                true
            }
            _ => false,
        }
    }

    /// Number of stored entries that have not been consumed.
    pub fn live_len(&self) -> usize {
        self.entries
            .iter()
            .flatten()
            .filter(|entry| !entry.consumed)
            .count()
    }
}
