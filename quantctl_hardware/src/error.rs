use thiserror::Error;

/// Error taxonomy for a concrete `HardwareIo` driver. `quantctl_core::hw_error`
/// downcasts this (behind the `hardware-errors` feature) for a precise
/// mapping to its own `HardwareError`; an unknown driver's error type just
/// falls back to string heuristics there.
#[derive(Debug, Error, Clone)]
pub enum HardwareError {
    #[error("hardware not connected")]
    NotConnected,
    #[error("hardware operation timed out")]
    Timeout,
    #[error("i/o error: {0}")]
    Io(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("hardware rejected the request: {0}")]
    Rejected(String),
}

impl From<std::io::Error> for HardwareError {
    fn from(e: std::io::Error) -> Self {
        HardwareError::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HardwareError>;
