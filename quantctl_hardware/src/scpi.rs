//! Real `HardwareIo` driver talking SCPI ASCII commands over a serial port
//! to a two-channel arbitrary-waveform generator + oscilloscope. Enabled
//! with `feature = "hardware"`; the rest of the crate (and every other
//! crate in the workspace) builds without a serial port available.

use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use quantctl_traits::hardware::{ChannelSamples, HardwareIo, HwIoError, Waveform};
use serialport::SerialPort;

use crate::error::HardwareError;
use crate::util::{cmd_output, cmd_set_amplitude, cmd_set_frequency, cmd_set_function, parse_csv_reply};

pub struct ScpiHardware {
    port: Box<dyn SerialPort>,
    connected: bool,
}

impl ScpiHardware {
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self, HardwareError> {
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .open()
            .map_err(|e| HardwareError::Io(e.to_string()))?;
        Ok(Self { port, connected: true })
    }

    fn write_line(&mut self, line: &str) -> Result<(), HardwareError> {
        writeln!(self.port, "{line}").map_err(HardwareError::from)
    }

    fn query_line(&mut self, line: &str) -> Result<String, HardwareError> {
        self.write_line(line)?;
        let mut reader = BufReader::new(&mut self.port);
        let mut reply = String::new();
        reader.read_line(&mut reply).map_err(HardwareError::from)?;
        Ok(reply)
    }
}

/// `HwIoError` is a type alias for a foreign boxed trait object, so a plain
/// `impl From<HardwareError> for HwIoError` would violate the orphan rule;
/// box explicitly at each boundary instead.
fn boxed(e: HardwareError) -> HwIoError {
    Box::new(e)
}

impl HardwareIo for ScpiHardware {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn configure_generator(&mut self, waveform: Waveform, amp_vpp: f64, offset_v: f64) -> Result<(), HwIoError> {
        self.write_line(&cmd_set_function(waveform)).map_err(boxed)?;
        self.write_line(&cmd_set_amplitude(amp_vpp, offset_v)).map_err(boxed)?;
        Ok(())
    }

    fn set_frequency(&mut self, hz: f64) -> Result<(), HwIoError> {
        self.write_line(&cmd_set_frequency(hz)).map_err(boxed)
    }

    fn start_output(&mut self) -> Result<(), HwIoError> {
        self.write_line(&cmd_output(true)).map_err(boxed)
    }

    fn stop_output(&mut self) -> Result<(), HwIoError> {
        self.write_line(&cmd_output(false)).map_err(boxed)
    }

    fn start_stream(&mut self, sample_rate_hz: u32, voltage_range_v: f64) -> Result<(), HwIoError> {
        self.write_line(&format!("ACQ:SRAT {sample_rate_hz}")).map_err(boxed)?;
        self.write_line(&format!("CHAN1:RANG {voltage_range_v:.3};CHAN2:RANG {voltage_range_v:.3}"))
            .map_err(boxed)?;
        self.write_line("ACQ:STAT RUN").map_err(boxed)
    }

    fn stop_stream(&mut self) -> Result<(), HwIoError> {
        self.write_line("ACQ:STAT STOP").map_err(boxed)
    }

    fn read_stream(&mut self, seconds: f64) -> Result<ChannelSamples, HwIoError> {
        self.write_line(&format!("ACQ:TIME {seconds:.6}")).map_err(boxed)?;
        let ch1_reply = self.query_line("CHAN1:DATA?").map_err(boxed)?;
        let ch2_reply = self.query_line("CHAN2:DATA?").map_err(boxed)?;
        let ch1 = parse_csv_reply(&ch1_reply).map_err(|e| boxed(HardwareError::Rejected(e.to_string())))?;
        let ch2 = parse_csv_reply(&ch2_reply).map_err(|e| boxed(HardwareError::Rejected(e.to_string())))?;
        Ok(ChannelSamples { ch1, ch2 })
    }
}
