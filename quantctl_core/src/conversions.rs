//! Bridges from `quantctl_config`'s deserialized file shapes to this crate's
//! runtime types. Kept as a dedicated module (rather than scattering `From`
//! impls next to each type) because every conversion here has a fallible or
//! default-filling side to it, the way `doser_config::PersistedCalibration ->
//! Calibration` warranted its own explicit `impl From`.

use quantctl_traits::hardware::{OutputMode, Waveform};

use crate::builder::{AssessmentConfigBuilder, BuildError, ProtocolBuilder, StepBuilder};
use crate::safety::SafetyLimits;
use crate::types::{AssessmentConfig, Protocol};

impl From<quantctl_config::protocol::WaveformCfg> for Waveform {
    fn from(w: quantctl_config::protocol::WaveformCfg) -> Self {
        match w {
            quantctl_config::protocol::WaveformCfg::Sine => Waveform::Sine,
            quantctl_config::protocol::WaveformCfg::Square => Waveform::Square,
            quantctl_config::protocol::WaveformCfg::Triangle => Waveform::Triangle,
            quantctl_config::protocol::WaveformCfg::Arbitrary => Waveform::Arbitrary,
        }
    }
}

impl From<quantctl_config::protocol::OutputModeCfg> for OutputMode {
    fn from(m: quantctl_config::protocol::OutputModeCfg) -> Self {
        match m {
            quantctl_config::protocol::OutputModeCfg::Continuous => OutputMode::Continuous,
            quantctl_config::protocol::OutputModeCfg::Burst => OutputMode::Burst,
            quantctl_config::protocol::OutputModeCfg::Gated => OutputMode::Gated,
        }
    }
}

impl From<&quantctl_config::SafetyLimitsCfg> for SafetyLimits {
    fn from(cfg: &quantctl_config::SafetyLimitsCfg) -> Self {
        let defaults = SafetyLimits::default();
        SafetyLimits {
            max_amp_vpp: cfg.max_amp_vpp,
            max_offset_v: cfg.max_offset_v,
            max_total_voltage: cfg.max_total_voltage,
            min_frequency_hz: cfg.min_frequency_hz,
            max_frequency_hz: cfg.max_frequency_hz,
            max_session_duration_min: cfg.max_session_duration_min,
            max_single_frequency_duration_min: cfg.max_single_frequency_duration_min,
            require_series_resistor_ohm: cfg.require_series_resistor_ohm,
            require_isolation_confirmed: cfg.require_isolation_confirmed,
            min_isolation_resistance_ohm: cfg.min_isolation_resistance_ohm,
            forbidden_patient_flags: if cfg.forbidden_patient_flags.is_empty() {
                defaults.forbidden_patient_flags
            } else {
                cfg.forbidden_patient_flags.iter().map(|f| (f.clone(), true)).collect()
            },
            required_confirmations: if cfg.required_confirmations.is_empty() {
                defaults.required_confirmations
            } else {
                cfg.required_confirmations.clone()
            },
        }
    }
}

/// Converts a parsed protocol file into the runtime `Protocol`, validating
/// every step through [`StepBuilder`] so a malformed file surfaces the same
/// `BuildError` a hand-constructed protocol would.
impl TryFrom<quantctl_config::protocol::ProtocolFile> for Protocol {
    type Error = BuildError;

    fn try_from(file: quantctl_config::protocol::ProtocolFile) -> Result<Self, Self::Error> {
        let mut builder = ProtocolBuilder::new()
            .name(file.name)
            .author(file.author)
            .version(file.version)
            .created_at(file.created_at)
            .description(file.description);

        if let Some(cfg) = &file.safety_limits {
            builder = builder.safety_limits(SafetyLimits::from(cfg));
        }

        for step in file.steps {
            let mut step_builder = StepBuilder::new()
                .label(step.label)
                .frequency_hz(step.frequency_hz)
                .amp_vpp(step.amp_vpp)
                .offset_v(step.offset_v)
                .waveform(step.waveform.into())
                .mode(step.mode.into())
                .duration_min(step.duration_min)
                .ramp_ms(step.ramp_ms);
            if let Some(cycles) = step.burst_cycles {
                step_builder = step_builder.burst_cycles(cycles);
            }
            builder = builder.step(step_builder.build()?);
        }

        builder.build()
    }
}

/// Assembles an `AssessmentConfig` from a list of catalog frequencies plus
/// the `[assessment]`/`[hardware]` sections of the runtime config file.
pub fn assessment_config_from_parts(
    name: impl Into<String>,
    frequencies_hz: Vec<f64>,
    assessment: &quantctl_config::AssessmentDefaultsCfg,
    hardware: &quantctl_config::HardwareCfg,
) -> Result<AssessmentConfig, BuildError> {
    assessment_config_from_parts_with_safety(name, frequencies_hz, assessment, hardware, None)
}

/// Same as [`assessment_config_from_parts`], with an optional per-session
/// `SafetyLimits` override (e.g. from a `[safety]` table scoped to one
/// assessment run rather than the whole host config).
pub fn assessment_config_from_parts_with_safety(
    name: impl Into<String>,
    frequencies_hz: Vec<f64>,
    assessment: &quantctl_config::AssessmentDefaultsCfg,
    hardware: &quantctl_config::HardwareCfg,
    safety_limits: Option<&quantctl_config::SafetyLimitsCfg>,
) -> Result<AssessmentConfig, BuildError> {
    let mut builder = AssessmentConfigBuilder::new()
        .name(name)
        .frequencies_hz(frequencies_hz)
        .amp_vpp(assessment.amp_vpp)
        .baseline_duration_s(assessment.baseline_duration_s)
        .per_frequency_duration_s(assessment.per_frequency_duration_s)
        .randomize_order(assessment.randomize_order)
        .series_resistor_ohm(hardware.series_resistor_ohm)
        .sample_rate_hz(hardware.sample_rate_hz)
        .voltage_range_v(hardware.voltage_range_v)
        .top_n(assessment.top_n);
    if let Some(cfg) = safety_limits {
        builder = builder.safety_limits(SafetyLimits::from(cfg));
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_file_converts_into_runtime_protocol() {
        let file = quantctl_config::protocol::load_protocol_toml(
            r#"
name = "demo"

[[step]]
label = "only step"
frequency_hz = 100.0
amp_vpp = 1.0
duration_min = 1.0
"#,
        )
        .unwrap();
        let protocol: Protocol = file.try_into().unwrap();
        assert_eq!(protocol.steps.len(), 1);
        assert_eq!(protocol.author, "system");
    }

    #[test]
    fn empty_config_override_falls_back_to_defaults() {
        let cfg = quantctl_config::SafetyLimitsCfg::default();
        let limits: SafetyLimits = (&cfg).into();
        assert!(!limits.forbidden_patient_flags.is_empty());
        assert!(!limits.required_confirmations.is_empty());
    }

    #[test]
    fn assembles_assessment_config_from_parts() {
        let assessment = quantctl_config::AssessmentDefaultsCfg::default();
        let hardware = quantctl_config::HardwareCfg::default();
        let config = assessment_config_from_parts("sweep", vec![100.0, 200.0], &assessment, &hardware).unwrap();
        assert_eq!(config.frequencies_hz.len(), 2);
    }
}
