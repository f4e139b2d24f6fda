//! Example: Simulated Hardware Implementation

use quantctl_traits::hardware::{ChannelSamples, HardwareIo, HwIoError, Waveform};

#[derive(Default)]
pub struct FixedToneHardware {
    frequency_hz: f64,
    outputting: bool,
}

impl HardwareIo for FixedToneHardware {
    fn is_connected(&self) -> bool {
        true
    }

    fn configure_generator(&mut self, _waveform: Waveform, _amp_vpp: f64, _offset_v: f64) -> Result<(), HwIoError> {
        Ok(())
    }

    fn set_frequency(&mut self, hz: f64) -> Result<(), HwIoError> {
        self.frequency_hz = hz;
        Ok(())
    }

    fn start_output(&mut self) -> Result<(), HwIoError> {
        self.outputting = true;
        Ok(())
    }

    fn stop_output(&mut self) -> Result<(), HwIoError> {
        self.outputting = false;
        Ok(())
    }

    fn start_stream(&mut self, _sample_rate_hz: u32, _voltage_range_v: f64) -> Result<(), HwIoError> {
        Ok(())
    }

    fn stop_stream(&mut self) -> Result<(), HwIoError> {
        Ok(())
    }

    fn read_stream(&mut self, seconds: f64) -> Result<ChannelSamples, HwIoError> {
        let n = (seconds * 1_000.0).round().max(1.0) as usize;
        let level = if self.outputting { 1.0 } else { 0.0 };
        Ok(ChannelSamples { ch1: vec![level; n], ch2: vec![level; n] })
    }
}
