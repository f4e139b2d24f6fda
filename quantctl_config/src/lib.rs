#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and file loaders for the therapy/assessment host.
//!
//! - [`Config`] and sub-structs deserialize `etc/quantctl_config.toml` and
//!   validate it.
//! - [`protocol`] loads a `Protocol` definition from its own TOML file.
//! - [`catalog`] loads a frequency catalog from a strict-header CSV, the
//!   same enforcement style `doser_config::load_calibration_csv` used for
//!   calibration rows.

use serde::Deserialize;

pub mod catalog;
pub mod protocol;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SafetyLimitsCfg {
    pub max_amp_vpp: f64,
    pub max_offset_v: f64,
    pub max_total_voltage: f64,
    pub min_frequency_hz: f64,
    pub max_frequency_hz: f64,
    pub max_session_duration_min: f64,
    pub max_single_frequency_duration_min: f64,
    pub require_series_resistor_ohm: f64,
    pub require_isolation_confirmed: bool,
    pub min_isolation_resistance_ohm: f64,
    /// Blocking patient-chart flags. Empty means "use the built-in default
    /// list" — an explicitly-empty override has to be spelled as
    /// `forbidden_patient_flags = []` together with a comment, since TOML
    /// can't distinguish "absent" from "empty array" once defaulted.
    pub forbidden_patient_flags: Vec<String>,
    pub required_confirmations: Vec<String>,
}

impl Default for SafetyLimitsCfg {
    fn default() -> Self {
        Self {
            max_amp_vpp: 2.0,
            max_offset_v: 0.5,
            max_total_voltage: 2.5,
            min_frequency_hz: 0.1,
            max_frequency_hz: 100_000.0,
            max_session_duration_min: 120.0,
            max_single_frequency_duration_min: 30.0,
            require_series_resistor_ohm: 100_000.0,
            require_isolation_confirmed: true,
            min_isolation_resistance_ohm: 1_000_000.0,
            forbidden_patient_flags: Vec::new(),
            required_confirmations: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HardwareCfg {
    /// Serial device path (`/dev/ttyUSB0`) or loopback sentinel `"simulated"`.
    pub endpoint: String,
    pub baud: u32,
    pub voltage_range_v: f64,
    pub sample_rate_hz: u32,
    /// Physical series resistor actually installed in the patient path.
    pub series_resistor_ohm: f64,
}

impl Default for HardwareCfg {
    fn default() -> Self {
        Self {
            endpoint: "simulated".to_string(),
            baud: 115_200,
            voltage_range_v: 5.0,
            sample_rate_hz: 10_000,
            series_resistor_ohm: 100_000.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LoggingCfg {
    pub file: Option<String>,
    pub level: Option<String>,
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssessmentDefaultsCfg {
    pub baseline_duration_s: f64,
    pub per_frequency_duration_s: f64,
    pub randomize_order: bool,
    pub amp_vpp: f64,
    /// Keep only the `top_n` highest-scoring results; a generously large
    /// default means "don't truncate" unless the operator opts in.
    pub top_n: usize,
}

impl Default for AssessmentDefaultsCfg {
    fn default() -> Self {
        Self {
            baseline_duration_s: 2.0,
            per_frequency_duration_s: 2.0,
            randomize_order: false,
            amp_vpp: 1.0,
            top_n: usize::MAX,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub safety: SafetyLimitsCfg,
    #[serde(default)]
    pub hardware: HardwareCfg,
    #[serde(default)]
    pub logging: LoggingCfg,
    #[serde(default)]
    pub assessment: AssessmentDefaultsCfg,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            safety: SafetyLimitsCfg::default(),
            hardware: HardwareCfg::default(),
            logging: LoggingCfg::default(),
            assessment: AssessmentDefaultsCfg::default(),
        }
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.safety.max_amp_vpp <= 0.0 {
            eyre::bail!("safety.max_amp_vpp must be > 0");
        }
        if self.safety.max_offset_v < 0.0 {
            eyre::bail!("safety.max_offset_v must be >= 0");
        }
        if self.safety.max_total_voltage <= 0.0 {
            eyre::bail!("safety.max_total_voltage must be > 0");
        }
        if self.safety.min_frequency_hz <= 0.0 {
            eyre::bail!("safety.min_frequency_hz must be > 0");
        }
        if self.safety.max_frequency_hz <= self.safety.min_frequency_hz {
            eyre::bail!("safety.max_frequency_hz must be > safety.min_frequency_hz");
        }
        if self.safety.max_session_duration_min <= 0.0 {
            eyre::bail!("safety.max_session_duration_min must be > 0");
        }
        if self.safety.max_single_frequency_duration_min <= 0.0 {
            eyre::bail!("safety.max_single_frequency_duration_min must be > 0");
        }
        if self.safety.require_series_resistor_ohm <= 0.0 {
            eyre::bail!("safety.require_series_resistor_ohm must be > 0");
        }
        if self.safety.min_isolation_resistance_ohm <= 0.0 {
            eyre::bail!("safety.min_isolation_resistance_ohm must be > 0");
        }

        if self.hardware.endpoint.trim().is_empty() {
            eyre::bail!("hardware.endpoint must not be empty");
        }
        if self.hardware.baud == 0 {
            eyre::bail!("hardware.baud must be > 0");
        }
        if self.hardware.voltage_range_v <= 0.0 {
            eyre::bail!("hardware.voltage_range_v must be > 0");
        }
        if self.hardware.sample_rate_hz == 0 {
            eyre::bail!("hardware.sample_rate_hz must be > 0");
        }
        if self.hardware.series_resistor_ohm <= 0.0 {
            eyre::bail!("hardware.series_resistor_ohm must be > 0");
        }

        if let Some(level) = &self.logging.level {
            let known = ["trace", "debug", "info", "warn", "error"];
            if !known.contains(&level.to_ascii_lowercase().as_str()) {
                eyre::bail!("logging.level must be one of {known:?}, got {level:?}");
            }
        }
        if let Some(rotation) = &self.logging.rotation {
            let known = ["never", "daily", "hourly"];
            if !known.contains(&rotation.to_ascii_lowercase().as_str()) {
                eyre::bail!("logging.rotation must be one of {known:?}, got {rotation:?}");
            }
        }

        if self.assessment.baseline_duration_s <= 0.0 {
            eyre::bail!("assessment.baseline_duration_s must be > 0");
        }
        if self.assessment.per_frequency_duration_s <= 0.0 {
            eyre::bail!("assessment.per_frequency_duration_s must be > 0");
        }
        if self.assessment.amp_vpp <= 0.0 {
            eyre::bail!("assessment.amp_vpp must be > 0");
        }
        if self.assessment.top_n == 0 {
            eyre::bail!("assessment.top_n must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        Config::default().validate().expect("defaults should be valid");
    }

    #[test]
    fn rejects_inverted_frequency_range() {
        let toml = r#"
[safety]
min_frequency_hz = 100.0
max_frequency_hz = 10.0
"#;
        let cfg = load_toml(toml).expect("parse TOML");
        let err = cfg.validate().expect_err("should reject inverted range");
        assert!(err.to_string().contains("max_frequency_hz"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let toml = r#"
[logging]
level = "verbose"
"#;
        let cfg = load_toml(toml).expect("parse TOML");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let toml = r#"
[hardware]
sample_rate_hz = 0
"#;
        let cfg = load_toml(toml).expect("parse TOML");
        assert!(cfg.validate().is_err());
    }
}
