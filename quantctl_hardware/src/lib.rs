#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Concrete `HardwareIo` drivers: an in-process loopback generator for
//! simulate/build/test, and (behind `feature = "hardware"`) a real
//! SCPI-over-serial driver for a two-channel arbitrary-waveform generator +
//! oscilloscope.

pub mod error;
#[cfg(feature = "hardware")]
pub mod scpi;
pub mod util;

use quantctl_traits::hardware::{ChannelSamples, HardwareIo, HwIoError, Waveform};

/// In-process loopback `HardwareIo`: synthesizes CH1/CH2 samples from the
/// currently-configured waveform instead of talking to any transport.
/// Grounded on `doser_hardware::SimulatedScale`/`SimulatedMotor`'s role as
/// the default build-and-test target — same unrefined `println!`-on-state-
/// change texture, since that's the teacher's own style for its simulated
/// peripherals.
pub struct LoopbackHardware {
    connected: bool,
    waveform: Waveform,
    amp_vpp: f64,
    offset_v: f64,
    frequency_hz: f64,
    outputting: bool,
    streaming: bool,
    sample_rate_hz: u32,
}

impl Default for LoopbackHardware {
    fn default() -> Self {
        Self {
            connected: true,
            waveform: Waveform::Sine,
            amp_vpp: 0.0,
            offset_v: 0.0,
            frequency_hz: 1.0,
            outputting: false,
            streaming: false,
            sample_rate_hz: 10_000,
        }
    }
}

impl LoopbackHardware {
    pub fn new() -> Self {
        Self::default()
    }

    fn synthesize(&self, n: usize, amp_vpp: f64, offset_v: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / f64::from(self.sample_rate_hz);
                let phase = 2.0 * std::f64::consts::PI * self.frequency_hz * t;
                let shape = match self.waveform {
                    Waveform::Sine => phase.sin(),
                    Waveform::Square => phase.sin().signum(),
                    Waveform::Triangle => (2.0 / std::f64::consts::PI) * phase.sin().asin(),
                    Waveform::Arbitrary => phase.sin(),
                };
                offset_v + (amp_vpp / 2.0) * shape
            })
            .collect()
    }
}

impl HardwareIo for LoopbackHardware {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn configure_generator(&mut self, waveform: Waveform, amp_vpp: f64, offset_v: f64) -> Result<(), HwIoError> {
        self.waveform = waveform;
        self.amp_vpp = amp_vpp;
        self.offset_v = offset_v;
        println!("generator configured (loopback): {waveform:?} {amp_vpp:.3}Vpp @ {offset_v:.3}V offset");
        Ok(())
    }

    fn set_frequency(&mut self, hz: f64) -> Result<(), HwIoError> {
        self.frequency_hz = hz;
        Ok(())
    }

    fn start_output(&mut self) -> Result<(), HwIoError> {
        self.outputting = true;
        println!("output started (loopback)");
        Ok(())
    }

    fn stop_output(&mut self) -> Result<(), HwIoError> {
        self.outputting = false;
        println!("output stopped (loopback)");
        Ok(())
    }

    fn start_stream(&mut self, sample_rate_hz: u32, _voltage_range_v: f64) -> Result<(), HwIoError> {
        self.sample_rate_hz = sample_rate_hz;
        self.streaming = true;
        Ok(())
    }

    fn stop_stream(&mut self) -> Result<(), HwIoError> {
        self.streaming = false;
        Ok(())
    }

    fn read_stream(&mut self, seconds: f64) -> Result<ChannelSamples, HwIoError> {
        if !self.streaming {
            return Err(Box::new(error::HardwareError::Rejected("stream not started".into())));
        }
        let n = (seconds * f64::from(self.sample_rate_hz)).round().max(1.0) as usize;
        if self.outputting {
            let ch1 = self.synthesize(n, self.amp_vpp / 100.0, 0.0);
            let ch2 = self.synthesize(n, self.amp_vpp, self.offset_v);
            Ok(ChannelSamples { ch1, ch2 })
        } else {
            Ok(ChannelSamples { ch1: vec![0.0; n], ch2: vec![0.0; n] })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_stream_requires_start_stream_first() {
        let mut hw = LoopbackHardware::new();
        assert!(hw.read_stream(0.1).is_err());
        hw.start_stream(1_000, 5.0).unwrap();
        assert!(hw.read_stream(0.1).is_ok());
    }

    #[test]
    fn idle_output_produces_zero_samples() {
        let mut hw = LoopbackHardware::new();
        hw.start_stream(1_000, 5.0).unwrap();
        let samples = hw.read_stream(0.01).unwrap();
        assert!(samples.ch2.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn active_output_produces_nonzero_samples() {
        let mut hw = LoopbackHardware::new();
        hw.configure_generator(Waveform::Sine, 2.0, 0.0).unwrap();
        hw.set_frequency(50.0).unwrap();
        hw.start_output().unwrap();
        hw.start_stream(1_000, 5.0).unwrap();
        let samples = hw.read_stream(0.1).unwrap();
        assert!(samples.ch2.iter().any(|&v| v != 0.0));
    }
}
