//! Test doubles shared by `runner.rs`/`worker.rs`/`safety.rs` unit tests.
//! Not `#[cfg(test)]`-gated for the same cross-crate-visibility reason as
//! `quantctl_traits::clock::test_clock`; downstream crates should still only
//! reach for it from their own test code.

use quantctl_traits::hardware::{ChannelSamples, HardwareIo, HwIoError, Waveform};

/// A deterministic, in-memory `HardwareIo` that synthesizes sine samples at
/// the configured amplitude/offset/frequency instead of talking to any
/// transport. Grounded on `doser_hardware::SimulatedScale`/`SimulatedMotor`'s
/// role as the default build-and-test target.
#[derive(Debug, Clone)]
pub struct FakeHardware {
    pub connected: bool,
    pub amp_vpp: f64,
    pub offset_v: f64,
    pub frequency_hz: f64,
    pub waveform: Waveform,
    pub streaming: bool,
    pub sample_rate_hz: u32,
    pub outputting: bool,
    /// When set, the next `read_stream` call returns this error instead of
    /// synthesizing samples.
    pub fail_next_read: Option<String>,
    pub configure_calls: usize,
}

impl Default for FakeHardware {
    fn default() -> Self {
        Self {
            connected: true,
            amp_vpp: 0.0,
            offset_v: 0.0,
            frequency_hz: 1.0,
            waveform: Waveform::Sine,
            streaming: false,
            sample_rate_hz: 10_000,
            outputting: false,
            fail_next_read: None,
            configure_calls: 0,
        }
    }
}

impl HardwareIo for FakeHardware {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn configure_generator(&mut self, waveform: Waveform, amp_vpp: f64, offset_v: f64) -> Result<(), HwIoError> {
        if !self.connected {
            return Err("not connected".into());
        }
        self.waveform = waveform;
        self.amp_vpp = amp_vpp;
        self.offset_v = offset_v;
        self.configure_calls += 1;
        Ok(())
    }

    fn set_frequency(&mut self, hz: f64) -> Result<(), HwIoError> {
        if !self.connected {
            return Err("not connected".into());
        }
        self.frequency_hz = hz;
        Ok(())
    }

    fn start_output(&mut self) -> Result<(), HwIoError> {
        if !self.connected {
            return Err("not connected".into());
        }
        self.outputting = true;
        Ok(())
    }

    fn stop_output(&mut self) -> Result<(), HwIoError> {
        self.outputting = false;
        Ok(())
    }

    fn start_stream(&mut self, sample_rate_hz: u32, _voltage_range_v: f64) -> Result<(), HwIoError> {
        if !self.connected {
            return Err("not connected".into());
        }
        self.sample_rate_hz = sample_rate_hz;
        self.streaming = true;
        Ok(())
    }

    fn stop_stream(&mut self) -> Result<(), HwIoError> {
        self.streaming = false;
        Ok(())
    }

    fn read_stream(&mut self, seconds: f64) -> Result<ChannelSamples, HwIoError> {
        if let Some(msg) = self.fail_next_read.take() {
            return Err(msg.into());
        }
        if !self.streaming {
            return Err("stream not started".into());
        }
        let n = (seconds * f64::from(self.sample_rate_hz)).round().max(1.0) as usize;
        let series = |amp: f64, offset: f64| -> Vec<f64> {
            (0..n)
                .map(|i| {
                    let t = i as f64 / f64::from(self.sample_rate_hz);
                    offset + (amp / 2.0) * (2.0 * std::f64::consts::PI * self.frequency_hz * t).sin()
                })
                .collect()
        };
        let ch1 = if self.outputting {
            series(self.amp_vpp / 100.0, 0.0)
        } else {
            vec![0.0; n]
        };
        let ch2 = if self.outputting {
            series(self.amp_vpp, self.offset_v)
        } else {
            vec![0.0; n]
        };
        Ok(ChannelSamples { ch1, ch2 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_stream_requires_streaming_started() {
        let mut hw = FakeHardware::default();
        assert!(hw.read_stream(0.1).is_err());
        hw.start_stream(10_000, 5.0).unwrap();
        assert!(hw.read_stream(0.1).is_ok());
    }

    #[test]
    fn disconnected_hardware_rejects_configuration() {
        let mut hw = FakeHardware { connected: false, ..Default::default() };
        assert!(hw.configure_generator(Waveform::Sine, 1.0, 0.0).is_err());
    }
}
