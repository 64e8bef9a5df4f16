//! Prometheus-style telemetry for the sequencer.
//!
//! Recording is a no-op until the host installs a recorder.

use metrics::{counter, describe_counter, describe_gauge, gauge};

use crate::error::VerifyError;

pub const SEQUENCE_GAUGE: &str = "poh_sequence";
pub const SLOT_GAUGE: &str = "poh_slot";
pub const LOCKOUT_DEPTH_GAUGE: &str = "poh_lockout_depth";
pub const VERIFICATIONS_COUNTER: &str = "poh_verifications_total";

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    describe_gauge!(SEQUENCE_GAUGE, "Hashes produced since genesis");
    describe_gauge!(SLOT_GAUGE, "Current wrapped slot number");
    describe_gauge!(LOCKOUT_DEPTH_GAUGE, "Outstanding lockout entries");
    describe_counter!(
        VERIFICATIONS_COUNTER,
        "Verification attempts partitioned by result"
    );
}

pub(crate) fn record_slot(sequence: u64, slot: u64, lockout_depth: usize) {
    gauge!(SEQUENCE_GAUGE).set(sequence as f64);
    gauge!(SLOT_GAUGE).set(slot as f64);
    gauge!(LOCKOUT_DEPTH_GAUGE).set(lockout_depth as f64);
}

pub(crate) fn record_verification(result: &Result<(), VerifyError>) {
    let label = match result {
        Ok(()) => "valid",
        Err(err) => err.label(),
    };
    counter!(VERIFICATIONS_COUNTER, "result" => label).increment(1);
}
