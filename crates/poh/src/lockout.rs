//! Tower BFT style lockout bookkeeping.
//!
//! Outstanding lockouts are kept newest-vote-first. Every slot boundary
//! doubles each outstanding lockout and pushes a fresh vote with the base
//! lockout in front. The history is bounded: once full, the oldest vote
//! falls off the back.
//!
//! Lockouts count boundaries survived, not absolute slots, so wrapping of
//! the slot number has no effect on them.
//!
//! Doubling saturates at `u64::MAX`. A vote that has survived 64 or more
//! boundaries therefore holds `u64::MAX`, which is no longer a power of two.

use std::collections::VecDeque;

/// Lockout assigned to a freshly cast vote, in slots.
pub const BASE_LOCKOUT: u64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutTracker {
    lockouts: VecDeque<u64>,
    max_entries: usize,
}

impl LockoutTracker {
    pub fn new(max_entries: usize) -> Self {
        Self {
            lockouts: VecDeque::with_capacity(max_entries.min(1_024)),
            max_entries,
        }
    }

    /// Double outstanding lockouts and cast a new vote.
    pub fn on_slot_boundary(&mut self) {
        for lockout in self.lockouts.iter_mut().filter(|l| **l > 0) {
            *lockout = lockout.saturating_mul(2);
        }
        self.lockouts.push_front(BASE_LOCKOUT);
        if self.lockouts.len() > self.max_entries {
            self.lockouts.pop_back();
        }
    }

    /// Outstanding lockouts, newest vote first.
    pub fn lockouts(&self) -> Vec<u64> {
        self.lockouts.iter().copied().collect()
    }

    /// Lockout of the oldest vote still tracked.
    pub fn oldest(&self) -> Option<u64> {
        self.lockouts.back().copied()
    }

    pub fn len(&self) -> usize {
        self.lockouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lockouts.is_empty()
    }
}
