//! Validating fluent builders for `Protocol` and `AssessmentConfig`.
//!
//! `doser_core`'s builder used a compile-time typestate (`Missing`/`Set`
//! markers) to force every required field to be supplied before `.build()`
//! was even callable. That earns its keep when a recipe has a handful of
//! required scalar fields; here the two required inputs are a non-empty
//! `Vec<Step>` / `Vec<f64>`, which a typestate marker can't express any more
//! cheaply than a runtime check, so these builders validate in `.build()`
//! and return a `BuildError` instead.

use quantctl_traits::hardware::{OutputMode, Waveform};
use thiserror::Error;

use crate::safety::SafetyLimits;
use crate::types::{AssessmentConfig, Protocol, Step};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("{field} must be set")]
    MissingField { field: &'static str },
    #[error("{field} must be > 0, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("protocol must have at least one step")]
    NoSteps,
    #[error("assessment must list at least one frequency")]
    NoFrequencies,
}

#[derive(Debug, Clone, Default)]
pub struct StepBuilder {
    label: Option<String>,
    frequency_hz: Option<f64>,
    amp_vpp: Option<f64>,
    offset_v: f64,
    waveform: Waveform,
    mode: OutputMode,
    burst_cycles: Option<u32>,
    duration_min: Option<f64>,
    ramp_ms: u64,
}

impl StepBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn frequency_hz(mut self, hz: f64) -> Self {
        self.frequency_hz = Some(hz);
        self
    }

    pub fn amp_vpp(mut self, amp_vpp: f64) -> Self {
        self.amp_vpp = Some(amp_vpp);
        self
    }

    pub fn offset_v(mut self, offset_v: f64) -> Self {
        self.offset_v = offset_v;
        self
    }

    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn burst_cycles(mut self, cycles: u32) -> Self {
        self.burst_cycles = Some(cycles);
        self
    }

    pub fn duration_min(mut self, minutes: f64) -> Self {
        self.duration_min = Some(minutes);
        self
    }

    pub fn ramp_ms(mut self, ramp_ms: u64) -> Self {
        self.ramp_ms = ramp_ms;
        self
    }

    pub fn build(self) -> Result<Step, BuildError> {
        let frequency_hz = self.frequency_hz.ok_or(BuildError::MissingField { field: "frequency_hz" })?;
        if frequency_hz <= 0.0 {
            return Err(BuildError::NotPositive { field: "frequency_hz", value: frequency_hz });
        }
        let amp_vpp = self.amp_vpp.ok_or(BuildError::MissingField { field: "amp_vpp" })?;
        if amp_vpp <= 0.0 {
            return Err(BuildError::NotPositive { field: "amp_vpp", value: amp_vpp });
        }
        let duration_min = self.duration_min.ok_or(BuildError::MissingField { field: "duration_min" })?;
        if duration_min <= 0.0 {
            return Err(BuildError::NotPositive { field: "duration_min", value: duration_min });
        }

        Ok(Step {
            label: self.label.unwrap_or_default(),
            frequency_hz,
            amp_vpp,
            offset_v: self.offset_v,
            waveform: self.waveform,
            mode: self.mode,
            burst_cycles: self.burst_cycles,
            duration_min,
            ramp_ms: self.ramp_ms,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProtocolBuilder {
    name: Option<String>,
    author: Option<String>,
    version: Option<String>,
    created_at: Option<String>,
    description: String,
    safety_limits: Option<SafetyLimits>,
    steps: Vec<Step>,
}

impl ProtocolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn safety_limits(mut self, limits: SafetyLimits) -> Self {
        self.safety_limits = Some(limits);
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn build(self) -> Result<Protocol, BuildError> {
        if self.steps.is_empty() {
            return Err(BuildError::NoSteps);
        }
        Ok(Protocol {
            name: self.name.ok_or(BuildError::MissingField { field: "name" })?,
            author: self.author.unwrap_or_else(|| "system".to_string()),
            version: self.version.unwrap_or_else(|| "1.0".to_string()),
            created_at: self.created_at.unwrap_or_default(),
            description: self.description,
            safety_limits: self.safety_limits,
            steps: self.steps,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AssessmentConfigBuilder {
    name: Option<String>,
    frequencies_hz: Vec<f64>,
    amp_vpp: Option<f64>,
    offset_v: f64,
    waveform: Waveform,
    baseline_duration_s: Option<f64>,
    per_frequency_duration_s: Option<f64>,
    randomize_order: bool,
    series_resistor_ohm: Option<f64>,
    sample_rate_hz: u32,
    voltage_range_v: f64,
    top_n: Option<usize>,
    safety_limits: Option<SafetyLimits>,
}

impl Default for AssessmentConfigBuilder {
    fn default() -> Self {
        Self {
            name: None,
            frequencies_hz: Vec::new(),
            amp_vpp: None,
            offset_v: 0.0,
            waveform: Waveform::Sine,
            baseline_duration_s: None,
            per_frequency_duration_s: None,
            randomize_order: false,
            series_resistor_ohm: None,
            sample_rate_hz: 10_000,
            voltage_range_v: 5.0,
            top_n: None,
            safety_limits: None,
        }
    }
}

impl AssessmentConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn frequencies_hz(mut self, freqs: impl IntoIterator<Item = f64>) -> Self {
        self.frequencies_hz = freqs.into_iter().collect();
        self
    }

    pub fn amp_vpp(mut self, amp_vpp: f64) -> Self {
        self.amp_vpp = Some(amp_vpp);
        self
    }

    pub fn offset_v(mut self, offset_v: f64) -> Self {
        self.offset_v = offset_v;
        self
    }

    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn baseline_duration_s(mut self, seconds: f64) -> Self {
        self.baseline_duration_s = Some(seconds);
        self
    }

    pub fn per_frequency_duration_s(mut self, seconds: f64) -> Self {
        self.per_frequency_duration_s = Some(seconds);
        self
    }

    pub fn randomize_order(mut self, on: bool) -> Self {
        self.randomize_order = on;
        self
    }

    pub fn series_resistor_ohm(mut self, ohms: f64) -> Self {
        self.series_resistor_ohm = Some(ohms);
        self
    }

    pub fn sample_rate_hz(mut self, hz: u32) -> Self {
        self.sample_rate_hz = hz;
        self
    }

    pub fn voltage_range_v(mut self, v: f64) -> Self {
        self.voltage_range_v = v;
        self
    }

    /// Keep only the `n` highest-scoring results once the sweep finishes.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn safety_limits(mut self, limits: SafetyLimits) -> Self {
        self.safety_limits = Some(limits);
        self
    }

    pub fn build(self) -> Result<AssessmentConfig, BuildError> {
        if self.frequencies_hz.is_empty() {
            return Err(BuildError::NoFrequencies);
        }
        let amp_vpp = self.amp_vpp.ok_or(BuildError::MissingField { field: "amp_vpp" })?;
        if amp_vpp <= 0.0 {
            return Err(BuildError::NotPositive { field: "amp_vpp", value: amp_vpp });
        }
        let baseline_duration_s = self
            .baseline_duration_s
            .ok_or(BuildError::MissingField { field: "baseline_duration_s" })?;
        if baseline_duration_s <= 0.0 {
            return Err(BuildError::NotPositive { field: "baseline_duration_s", value: baseline_duration_s });
        }
        let per_frequency_duration_s = self
            .per_frequency_duration_s
            .ok_or(BuildError::MissingField { field: "per_frequency_duration_s" })?;
        if per_frequency_duration_s <= 0.0 {
            return Err(BuildError::NotPositive {
                field: "per_frequency_duration_s",
                value: per_frequency_duration_s,
            });
        }
        let series_resistor_ohm = self
            .series_resistor_ohm
            .ok_or(BuildError::MissingField { field: "series_resistor_ohm" })?;
        if series_resistor_ohm <= 0.0 {
            return Err(BuildError::NotPositive { field: "series_resistor_ohm", value: series_resistor_ohm });
        }
        let top_n = self.top_n.ok_or(BuildError::MissingField { field: "top_n" })?;
        if top_n == 0 {
            return Err(BuildError::NotPositive { field: "top_n", value: 0.0 });
        }

        Ok(AssessmentConfig {
            name: self.name.unwrap_or_default(),
            frequencies_hz: self.frequencies_hz,
            amp_vpp,
            offset_v: self.offset_v,
            waveform: self.waveform,
            baseline_duration_s,
            per_frequency_duration_s,
            randomize_order: self.randomize_order,
            series_resistor_ohm,
            sample_rate_hz: self.sample_rate_hz,
            voltage_range_v: self.voltage_range_v,
            top_n,
            safety_limits: self.safety_limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_builder_rejects_missing_required_fields() {
        let err = StepBuilder::new().amp_vpp(1.0).duration_min(1.0).build().unwrap_err();
        assert_eq!(err, BuildError::MissingField { field: "frequency_hz" });
    }

    #[test]
    fn step_builder_rejects_non_positive_duration() {
        let err = StepBuilder::new()
            .frequency_hz(100.0)
            .amp_vpp(1.0)
            .duration_min(0.0)
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::NotPositive { field: "duration_min", value: 0.0 });
    }

    #[test]
    fn protocol_builder_defaults_author_and_version() {
        let step = StepBuilder::new().frequency_hz(100.0).amp_vpp(1.0).duration_min(1.0).build().unwrap();
        let protocol = ProtocolBuilder::new().name("p1").step(step).build().unwrap();
        assert_eq!(protocol.author, "system");
        assert_eq!(protocol.version, "1.0");
    }

    #[test]
    fn protocol_builder_rejects_empty_steps() {
        let err = ProtocolBuilder::new().name("p1").build().unwrap_err();
        assert_eq!(err, BuildError::NoSteps);
    }

    #[test]
    fn assessment_builder_rejects_empty_frequencies() {
        let err = AssessmentConfigBuilder::new()
            .amp_vpp(1.0)
            .baseline_duration_s(2.0)
            .per_frequency_duration_s(2.0)
            .series_resistor_ohm(1_000.0)
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::NoFrequencies);
    }
}
