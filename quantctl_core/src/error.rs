//! Typed error taxonomy for the therapy/assessment core, plus a stable
//! `AbortReason`/`HardwareError` split the CLI maps to exit codes and JSON
//! fields, mirroring `doser_core::error::{DoserError, AbortReason}`.

use thiserror::Error;

use crate::safety::SafetyFault;

/// Why a session ended early.
#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    /// The host called `abort(reason)` / `abort()`.
    User(String),
    /// A hardware call failed mid-session.
    HardwareError { step_index: Option<usize> },
    /// The device reported `is_connected() == false` mid-session.
    HardwareLost,
    /// A `read_stream` call exceeded its internal deadline.
    HardwareTimeout,
}

impl core::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AbortReason::User(reason) => write!(f, "user abort: {reason}"),
            AbortReason::HardwareError { step_index: Some(i) } => {
                write!(f, "hardware error at step {i}")
            }
            AbortReason::HardwareError { step_index: None } => write!(f, "hardware error"),
            AbortReason::HardwareLost => write!(f, "hardware disconnected"),
            AbortReason::HardwareTimeout => write!(f, "hardware read timed out"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("safety check failed: {0:?}")]
    Safety(Vec<SafetyFault>),

    #[error("hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("session already active")]
    Busy,

    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{0}")]
    Aborted(AbortReason),
}

/// Hardware-layer error surfaced across the `HardwareIo` boundary, analogous
/// to `doser_hardware::error::HwError`.
#[derive(Debug, Error, Clone)]
pub enum HardwareError {
    #[error("hardware not connected")]
    NotConnected,
    #[error("hardware operation timed out")]
    Timeout,
    #[error("hardware rejected the request: {0}")]
    Rejected(String),
    #[error("hardware i/o error: {0}")]
    Io(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_reason_display_is_stable() {
        assert_eq!(AbortReason::User("user".into()).to_string(), "user abort: user");
        assert_eq!(
            AbortReason::HardwareError { step_index: Some(2) }.to_string(),
            "hardware error at step 2"
        );
        assert_eq!(AbortReason::HardwareLost.to_string(), "hardware disconnected");
        assert_eq!(AbortReason::HardwareTimeout.to_string(), "hardware read timed out");
    }
}
