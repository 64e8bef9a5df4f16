//! Delay function — the sequential hash state behind the chain.
//!
//! A `DelayState` is advanced by repeated SHA-256 iterations. External
//! 32-byte payloads can be mixed in, binding an event to the point in the
//! chain at which it was recorded.

use std::fmt;

use hex::{decode_to_slice, ToHex};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{PohError, Result};

/// Size in bytes of the delay state and of mix-in payloads.
pub const STATE_BYTES: usize = 32;

/// Fixed-size state of the delay function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelayState([u8; STATE_BYTES]);

impl DelayState {
    /// Adopt a raw 32-byte seed verbatim.
    pub const fn from_bytes(bytes: [u8; STATE_BYTES]) -> Self {
        Self(bytes)
    }

    /// Derive the initial state from arbitrary seed bytes.
    pub fn from_seed(seed: impl AsRef<[u8]>) -> Self {
        Self(Sha256::digest(seed.as_ref()).into())
    }

    /// Seed from OS entropy.
    pub fn random() -> Self {
        let mut bytes = [0u8; STATE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parse a 64-character hex rendering.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != STATE_BYTES * 2 {
            return Err(PohError::InvalidHex(format!(
                "state hex must be {} characters, got {}",
                STATE_BYTES * 2,
                hex_str.len()
            )));
        }
        let mut bytes = [0u8; STATE_BYTES];
        decode_to_slice(hex_str, &mut bytes).map_err(|e| PohError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; STATE_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.encode_hex::<String>()
    }

    /// One hash iteration, in place.
    pub fn advance(&mut self) {
        self.0 = Sha256::digest(self.0).into();
    }

    /// Hash `state || payload` and adopt the result.
    pub fn mix_in(&mut self, payload: &[u8; STATE_BYTES]) {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update(payload);
        self.0 = hasher.finalize().into();
    }

    /// Equivalent to `n` sequential calls to [`DelayState::advance`].
    pub fn advance_batch(&mut self, n: u64) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// State that follows `self` after one step, with or without a mix-in.
    pub fn successor(&self, mixin: Option<&[u8; STATE_BYTES]>) -> Self {
        let mut next = *self;
        match mixin {
            Some(payload) => next.mix_in(payload),
            None => next.advance(),
        }
        next
    }
}

impl fmt::Display for DelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; STATE_BYTES]> for DelayState {
    fn from(bytes: [u8; STATE_BYTES]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_sha256_of_state() {
        let mut state = DelayState::from_bytes([0u8; 32]);
        state.advance();
        // SHA-256 of 32 zero bytes.
        assert_eq!(
            state.to_hex(),
            "66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925"
        );
    }

    #[test]
    fn seed_derivation_is_deterministic() {
        let a = DelayState::from_seed("genesis");
        let b = DelayState::from_seed(b"genesis");
        assert_eq!(a, b);
        assert_ne!(a, DelayState::from_seed("genesis2"));
    }

    #[test]
    fn advance_batch_matches_sequential_advances() {
        let mut batched = DelayState::from_seed("batch");
        let mut sequential = batched;

        batched.advance_batch(64);
        for _ in 0..64 {
            sequential.advance();
        }

        assert_eq!(batched, sequential);
    }

    #[test]
    fn advance_batch_of_zero_is_a_no_op() {
        let mut state = DelayState::from_seed("noop");
        let before = state;
        state.advance_batch(0);
        assert_eq!(state, before);
    }

    #[test]
    fn mix_in_hashes_state_and_payload() {
        let mut state = DelayState::from_seed("mix");
        let payload = [9u8; 32];

        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(state.as_bytes());
        buf[32..].copy_from_slice(&payload);
        let expected: [u8; 32] = Sha256::digest(buf).into();

        state.mix_in(&payload);
        assert_eq!(state.as_bytes(), &expected);
    }

    #[test]
    fn mix_in_differs_from_plain_advance() {
        let base = DelayState::from_seed("mix");
        let plain = base.successor(None);
        let mixed = base.successor(Some(&[1u8; 32]));
        assert_ne!(plain, mixed);
        assert_ne!(mixed, base.successor(Some(&[2u8; 32])));
    }

    #[test]
    fn hex_round_trip_and_rejects_bad_input() {
        let state = DelayState::from_seed("hex");
        let encoded = state.to_string();
        assert_eq!(encoded.len(), 64);
        assert_eq!(encoded, encoded.to_lowercase());
        assert_eq!(DelayState::from_hex(&encoded).unwrap(), state);

        assert!(DelayState::from_hex("abc").is_err());
        assert!(DelayState::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn random_states_differ() {
        assert_ne!(DelayState::random(), DelayState::random());
    }
}
