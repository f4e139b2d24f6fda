//! `HardwareIo`: the capability bundle the core drives a two-channel
//! arbitrary-waveform generator + oscilloscope through.
//!
//! The core never names a concrete transport (USB/serial/GPIB/LAN). It depends
//! only on this trait, the same way `doser_traits::Scale`/`Motor` let `doser_core`
//! stay hardware-agnostic. A loopback/simulated implementation, a deterministic
//! replay fixture, and a real driver are all equally valid callers of this trait.

use std::time::Duration;

/// Error type returned across the `HardwareIo` boundary.
///
/// Kept as a boxed `Error` (mirroring `doser_traits::Scale::read`'s signature) so
/// `quantctl_core` can stay decoupled from any concrete driver's error enum;
/// `quantctl_core::hw_error::map_hw_error` downcasts known types for precise
/// mapping and falls back to string heuristics otherwise.
pub type HwIoError = Box<dyn std::error::Error + Send + Sync>;

/// Generator output waveform shape.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
    Arbitrary,
}

/// Generator output gating mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Free-running continuous output.
    #[default]
    Continuous,
    /// Fixed number of cycles per internal/external trigger.
    Burst,
    /// Output enabled only while an external trigger is asserted.
    Gated,
}

/// One acquisition window from both oscilloscope channels.
///
/// CH1 is the shunt channel (voltage across the known series resistor, used to
/// derive current); CH2 is the patient channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelSamples {
    pub ch1: Vec<f64>,
    pub ch2: Vec<f64>,
}

/// Capability bundle for a two-channel generator + oscilloscope.
///
/// `set_burst_by_cycles` and `enable_external_trigger_gated` are optional
/// capabilities: a driver that cannot support them returns
/// `Unsupported`-flavored errors via the default implementations below, the
/// same blanket-default pattern `doser_traits` uses for `Box<dyn Scale/Motor>`.
pub trait HardwareIo {
    fn is_connected(&self) -> bool;

    fn configure_generator(
        &mut self,
        waveform: Waveform,
        amp_vpp: f64,
        offset_v: f64,
    ) -> Result<(), HwIoError>;

    fn set_frequency(&mut self, hz: f64) -> Result<(), HwIoError>;

    /// Configure burst mode to output exactly `n` cycles per trigger.
    ///
    /// Default: unsupported. Override when the transport can do this.
    fn set_burst_by_cycles(&mut self, n: u32) -> Result<(), HwIoError> {
        let _ = n;
        Err("set_burst_by_cycles: unsupported by this HardwareIo implementation".into())
    }

    /// Enable or disable external-trigger-gated output.
    ///
    /// Default: unsupported. Override when the transport can do this.
    fn enable_external_trigger_gated(&mut self, on: bool) -> Result<(), HwIoError> {
        let _ = on;
        Err("enable_external_trigger_gated: unsupported by this HardwareIo implementation".into())
    }

    fn start_output(&mut self) -> Result<(), HwIoError>;
    fn stop_output(&mut self) -> Result<(), HwIoError>;

    fn start_stream(&mut self, sample_rate_hz: u32, voltage_range_v: f64) -> Result<(), HwIoError>;
    fn stop_stream(&mut self) -> Result<(), HwIoError>;

    /// Block until `seconds` worth of samples have been captured on both
    /// channels, or an internal deadline elapses.
    fn read_stream(&mut self, seconds: f64) -> Result<ChannelSamples, HwIoError>;
}

/// Allow `Box<dyn HardwareIo>` to satisfy a generic `H: HardwareIo` bound, the
/// same pattern `doser_traits` uses for `Box<dyn Scale>`/`Box<dyn Motor>`.
impl<T: ?Sized + HardwareIo> HardwareIo for Box<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn configure_generator(
        &mut self,
        waveform: Waveform,
        amp_vpp: f64,
        offset_v: f64,
    ) -> Result<(), HwIoError> {
        (**self).configure_generator(waveform, amp_vpp, offset_v)
    }

    fn set_frequency(&mut self, hz: f64) -> Result<(), HwIoError> {
        (**self).set_frequency(hz)
    }

    fn set_burst_by_cycles(&mut self, n: u32) -> Result<(), HwIoError> {
        (**self).set_burst_by_cycles(n)
    }

    fn enable_external_trigger_gated(&mut self, on: bool) -> Result<(), HwIoError> {
        (**self).enable_external_trigger_gated(on)
    }

    fn start_output(&mut self) -> Result<(), HwIoError> {
        (**self).start_output()
    }

    fn stop_output(&mut self) -> Result<(), HwIoError> {
        (**self).stop_output()
    }

    fn start_stream(&mut self, sample_rate_hz: u32, voltage_range_v: f64) -> Result<(), HwIoError> {
        (**self).start_stream(sample_rate_hz, voltage_range_v)
    }

    fn stop_stream(&mut self) -> Result<(), HwIoError> {
        (**self).stop_stream()
    }

    fn read_stream(&mut self, seconds: f64) -> Result<ChannelSamples, HwIoError> {
        (**self).read_stream(seconds)
    }
}

/// Margin added to a `read_stream(seconds)` call's internal deadline, per the
/// core's cancellation/timeout contract.
pub const READ_DEADLINE_MARGIN: Duration = Duration::from_secs(1);
