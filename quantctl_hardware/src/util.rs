//! SCPI command formatting and reply parsing shared by the simulated and
//! real drivers.

use quantctl_traits::hardware::Waveform;

pub fn waveform_scpi_name(waveform: Waveform) -> &'static str {
    match waveform {
        Waveform::Sine => "SIN",
        Waveform::Square => "SQU",
        Waveform::Triangle => "TRI",
        Waveform::Arbitrary => "ARB",
    }
}

/// `SOURce1:FUNCtion <shape>` SCPI command for the primary output channel.
pub fn cmd_set_function(waveform: Waveform) -> String {
    format!("SOUR1:FUNC {}", waveform_scpi_name(waveform))
}

/// `SOURce1:VOLTage <amp_vpp> VPP` + `SOURce1:VOLTage:OFFSet <offset_v>`.
pub fn cmd_set_amplitude(amp_vpp: f64, offset_v: f64) -> String {
    format!("SOUR1:VOLT {amp_vpp:.6}VPP;SOUR1:VOLT:OFFS {offset_v:.6}")
}

pub fn cmd_set_frequency(hz: f64) -> String {
    format!("SOUR1:FREQ {hz:.6}")
}

pub fn cmd_output(on: bool) -> String {
    format!("OUTP1 {}", if on { "ON" } else { "OFF" })
}

/// Parse a comma-separated SCPI numeric reply (e.g. from `:WAV:DATA?`) into
/// samples.
pub fn parse_csv_reply(reply: &str) -> Result<Vec<f64>, std::num::ParseFloatError> {
    reply
        .trim()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::parse::<f64>)
        .collect()
}
