//! Maps the hardware boundary's boxed `HwIoError` onto the core's own
//! `HardwareError` taxonomy.
//!
//! With the `hardware-errors` feature (the default), known driver error
//! types are downcast for a precise mapping; without it (or for an unknown
//! driver's error type) we fall back to a string-based heuristic. This
//! mirrors `doser_hardware`'s own error mapping at the `doser_core` boundary.

use quantctl_traits::hardware::HwIoError;

use crate::error::HardwareError;

pub fn map_hw_error(err: HwIoError) -> HardwareError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw_err) = err.downcast_ref::<quantctl_hardware::error::HardwareError>() {
            return match hw_err {
                quantctl_hardware::error::HardwareError::NotConnected => HardwareError::NotConnected,
                quantctl_hardware::error::HardwareError::Timeout => HardwareError::Timeout,
                quantctl_hardware::error::HardwareError::Unsupported(what) => {
                    HardwareError::Rejected(format!("unsupported: {what}"))
                }
                quantctl_hardware::error::HardwareError::Rejected(detail) => {
                    HardwareError::Rejected(detail.clone())
                }
                quantctl_hardware::error::HardwareError::Io(io_err) => {
                    HardwareError::Io(io_err.to_string())
                }
            };
        }
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("not connected") || lower.contains("disconnected") {
        HardwareError::NotConnected
    } else if lower.contains("timeout") || lower.contains("timed out") {
        HardwareError::Timeout
    } else if lower.contains("unsupported") {
        HardwareError::Rejected(msg)
    } else {
        HardwareError::Io(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_timeout_heuristic() {
        let err: HwIoError = "operation timed out waiting for trigger".into();
        assert!(matches!(map_hw_error(err), HardwareError::Timeout));
    }

    #[test]
    fn falls_back_to_not_connected_heuristic() {
        let err: HwIoError = "device not connected".into();
        assert!(matches!(map_hw_error(err), HardwareError::NotConnected));
    }

    #[test]
    fn downcasts_known_hardware_error() {
        let err: HwIoError = Box::new(quantctl_hardware::error::HardwareError::Timeout);
        assert!(matches!(map_hw_error(err), HardwareError::Timeout));
    }
}
