//! Single-use verification of stored chain links.
//!
//! A sequence verifies when its stored hash is the successor of the hash it
//! was derived from and, while the predecessor is still stored, that hash
//! matches the predecessor entry. A successful verification consumes the
//! entry, so the same link can never be asserted twice.

use tracing::debug;

use crate::error::VerifyError;
use crate::ring::HashRing;

/// Verify `sequence` against its predecessor and consume it on success.
///
/// On any failure the ring is left untouched.
pub fn verify(ring: &mut HashRing, sequence: u64) -> Result<(), VerifyError> {
    if sequence == 0 {
        return Err(VerifyError::NonPositive(sequence));
    }

    let entry = ring
        .link(sequence)
        .ok_or(VerifyError::OutsideWindow(sequence))?;
    if entry.consumed {
        return Err(VerifyError::Consumed(sequence));
    }

    if let Some(previous) = ring.link(sequence - 1) {
        if previous.hash != entry.previous {
            debug!(sequence, "PoH predecessor mismatch");
            return Err(VerifyError::Mismatch(sequence));
        }
    }

    let expected = entry.previous.successor(entry.mixin.as_ref());
    if expected != entry.hash {
        debug!(sequence, "PoH link mismatch");
        return Err(VerifyError::Mismatch(sequence));
    }

    ring.tombstone(sequence);
    Ok(())
}
