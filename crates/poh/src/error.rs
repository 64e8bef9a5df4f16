//! Error types for the PoH sequencer

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PohError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid hex state: {0}")]
    InvalidHex(String),

    #[error("Generation task failed: {0}")]
    Task(String),
}

/// Why a sequence failed verification.
///
/// Callers on the boolean boundary only ever see `false`; the variants exist
/// for diagnostics and tests.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("sequence {0} is not positive")]
    NonPositive(u64),

    #[error("sequence {0} is outside the live window")]
    OutsideWindow(u64),

    #[error("sequence {0} was already consumed")]
    Consumed(u64),

    #[error("hash at sequence {0} does not follow from its predecessor")]
    Mismatch(u64),
}

impl VerifyError {
    /// Short label used as a metrics dimension.
    pub fn label(&self) -> &'static str {
        match self {
            VerifyError::NonPositive(_) => "non_positive",
            VerifyError::OutsideWindow(_) => "outside_window",
            VerifyError::Consumed(_) => "consumed",
            VerifyError::Mismatch(_) => "mismatch",
        }
    }
}

pub type Result<T> = std::result::Result<T, PohError>;
