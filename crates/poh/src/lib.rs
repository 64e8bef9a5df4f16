//! Tower PoH Library
//!
//! A verifiable delay sequencer coupled to a Tower BFT style lockout
//! schedule.
//!
//! # Features
//! - SHA-256 delay chain with 32-byte event mix-ins
//! - Fixed-capacity ring of recent hashes indexed by sequence
//! - Wrapping slot clock derived from chain progress
//! - Bounded, exponentially growing vote lockouts
//! - Single-use (anti-replay) verification of chain links
//! - Tokio-driven generation task, paced or uncapped

pub mod config;
pub mod delay;
pub mod error;
pub mod lockout;
pub mod ring;
pub mod sequencer;
pub mod service;
pub mod slot;
pub mod telemetry;
pub mod verifier;

pub use config::SequencerConfig;
pub use delay::{DelayState, STATE_BYTES};
pub use error::{PohError, Result, VerifyError};
pub use lockout::{LockoutTracker, BASE_LOCKOUT};
pub use ring::{HashRing, RingEntry};
pub use sequencer::{Sequencer, Tick};
pub use service::{PohService, PohStatus};
pub use slot::SlotClock;
