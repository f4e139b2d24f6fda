//! Protocol file loading: a TOML document with one `[[step]]` table per
//! stimulation step, deserialized independently of the runtime `etc/quantctl_config.toml`.

use serde::Deserialize;

use crate::SafetyLimitsCfg;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum WaveformCfg {
    Sine,
    Square,
    Triangle,
    Arbitrary,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputModeCfg {
    #[default]
    Continuous,
    Burst,
    Gated,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StepFile {
    pub label: String,
    pub frequency_hz: f64,
    pub amp_vpp: f64,
    #[serde(default)]
    pub offset_v: f64,
    #[serde(default = "default_waveform")]
    pub waveform: WaveformCfg,
    #[serde(default)]
    pub mode: OutputModeCfg,
    pub burst_cycles: Option<u32>,
    pub duration_min: f64,
    #[serde(default)]
    pub ramp_ms: u64,
}

fn default_waveform() -> WaveformCfg {
    WaveformCfg::Sine
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProtocolFile {
    pub name: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub description: String,
    /// Per-protocol override of the host's configured `[safety]` limits.
    #[serde(default, rename = "safety")]
    pub safety_limits: Option<SafetyLimitsCfg>,
    #[serde(rename = "step")]
    pub steps: Vec<StepFile>,
}

fn default_author() -> String {
    "system".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

pub fn load_protocol_toml(s: &str) -> Result<ProtocolFile, toml::de::Error> {
    toml::from_str::<ProtocolFile>(s)
}

pub fn load_protocol_file(path: &std::path::Path) -> eyre::Result<ProtocolFile> {
    let raw = std::fs::read_to_string(path).map_err(|e| eyre::eyre!("read protocol file {:?}: {}", path, e))?;
    load_protocol_toml(&raw).map_err(|e| eyre::eyre!("parse protocol file {:?}: {}", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_two_step_protocol() {
        let toml = r#"
name = "sample protocol"

[[step]]
label = "warm up"
frequency_hz = 100.0
amp_vpp = 1.0
duration_min = 2.0

[[step]]
label = "main"
frequency_hz = 440.0
amp_vpp = 1.5
offset_v = 0.1
waveform = "square"
duration_min = 5.0
ramp_ms = 500
"#;
        let parsed = load_protocol_toml(toml).expect("parse protocol");
        assert_eq!(parsed.author, "system");
        assert_eq!(parsed.version, "1.0");
        assert_eq!(parsed.steps.len(), 2);
        assert_eq!(parsed.steps[1].waveform, WaveformCfg::Square);
    }

    #[test]
    fn rejects_missing_required_field() {
        let toml = r#"
name = "bad"

[[step]]
label = "s1"
amp_vpp = 1.0
duration_min = 1.0
"#;
        assert!(load_protocol_toml(toml).is_err());
    }
}
