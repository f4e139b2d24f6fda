//! Pure, side-effect-free safety kernel.
//!
//! Every function here is a total function of its arguments: no I/O, no
//! shared state, no clock. `ProtocolRunner::start` and `AssessmentWorker::start`
//! both drive the same kernel against the same `SafetyLimits` so the rules are
//! defined exactly once, the way `doser_core::error::DoserError`/`BuildError`
//! centralize the dosing engine's own precondition checks.

use std::collections::HashMap;

use thiserror::Error;

/// Structured, localization-free rejection of a proposed stimulus.
///
/// Human-facing rendering (localized strings, severity colors) is the host's
/// job; the kernel only ever hands back a *kind*.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SafetyFault {
    #[error("amplitude is invalid: {detail}")]
    AmplitudeInvalid { detail: String },
    #[error("{amp_vpp:.3} > {max:.3}")]
    AmplitudeExceedsMax { amp_vpp: f64, max: f64 },
    #[error("|{offset_v:.3}| > {max:.3}")]
    OffsetExceedsMax { offset_v: f64, max: f64 },
    #[error("{total:.3} > {max:.3}")]
    TotalVoltageExceedsMax { total: f64, max: f64 },
    #[error("frequency is invalid: {detail}")]
    FrequencyInvalid { detail: String },
    #[error("{hz} Hz < {min} Hz")]
    FrequencyBelowMin { hz: f64, min: f64 },
    #[error("{hz} Hz > {max} Hz")]
    FrequencyAboveMax { hz: f64, max: f64 },
    #[error("duration is invalid: {detail}")]
    DurationInvalid { detail: String },
    #[error("{minutes:.3} min > {max:.3} min")]
    DurationExceedsMax { minutes: f64, max: f64 },
    #[error("patient contraindication: {flag}")]
    PatientContraindicated { flag: String },
    #[error("missing required confirmation: {key}")]
    ConfirmationMissing { key: String },
    #[error("{parameter} is not finite")]
    ParameterNotFinite { parameter: String },
}

/// A patient-chart flag value as it arrives from whatever record system the
/// host reads. The kernel only ever coerces it to a boolean via [`PatientValue::is_truthy`].
#[derive(Debug, Clone, PartialEq)]
pub enum PatientValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for PatientValue {
    fn from(v: bool) -> Self {
        PatientValue::Bool(v)
    }
}

impl From<f64> for PatientValue {
    fn from(v: f64) -> Self {
        PatientValue::Number(v)
    }
}

impl From<&str> for PatientValue {
    fn from(v: &str) -> Self {
        PatientValue::Text(v.to_string())
    }
}

/// Locale-insensitive affirmative strings, matched after trimming and
/// lowercasing. Anything else (including absence of the key) is falsy.
const AFFIRMATIVE_STRINGS: &[&str] = &["sim", "yes", "true", "1", "positivo"];

impl PatientValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            PatientValue::Bool(b) => *b,
            PatientValue::Number(n) => *n != 0.0,
            PatientValue::Text(s) => {
                let lower = s.trim().to_ascii_lowercase();
                AFFIRMATIVE_STRINGS.contains(&lower.as_str())
            }
        }
    }
}

/// Immutable safety configuration. Defaults match the empirical thresholds
/// carried over from `original_source/biodesk/quantum/safety.py`.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyLimits {
    pub max_amp_vpp: f64,
    pub max_offset_v: f64,
    pub max_total_voltage: f64,
    pub min_frequency_hz: f64,
    pub max_frequency_hz: f64,
    pub max_session_duration_min: f64,
    pub max_single_frequency_duration_min: f64,
    /// Advisory to the caller; not independently enforced (no sensor path exists).
    pub require_series_resistor_ohm: f64,
    /// `flag_name -> blocking?`. Order matters only for human-facing display;
    /// a `Vec` keeps it deterministic without pulling in an ordered-map crate.
    pub forbidden_patient_flags: Vec<(String, bool)>,
    pub required_confirmations: Vec<String>,
    /// Supplemented from the source: fold `isolation_verified` into
    /// `required_confirmations` rather than treating it as a standalone
    /// advisory-only flag. See `SPEC_FULL.md` open-question decision 4.
    pub require_isolation_confirmed: bool,
    /// Advisory only; the kernel has no ohm-meter input to check this against.
    pub min_isolation_resistance_ohm: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        let forbidden_patient_flags = [
            "pacemaker",
            "implanted_defibrillator",
            "insulin_pump",
            "cochlear_implant",
            "deep_brain_stimulator",
            "metallic_implant",
            "epilepsy",
            "pregnancy",
            "active_cancer",
            "recent_chemo",
            "recent_radio",
            "minor",
            "critical_state",
            "anticoagulants",
            "seizure_history",
            "recent_invasive_procedure",
            "recent_surgery",
        ]
        .into_iter()
        .map(|f| (f.to_string(), true))
        .collect();

        let required_confirmations = [
            "isolation_verified",
            "series_resistor_installed",
            "patient_informed",
            "consent_signed",
            "emergency_prepared",
            "supervisor_present",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            max_amp_vpp: 2.0,
            max_offset_v: 0.5,
            max_total_voltage: 2.5,
            min_frequency_hz: 0.1,
            max_frequency_hz: 100_000.0,
            max_session_duration_min: 120.0,
            max_single_frequency_duration_min: 30.0,
            require_series_resistor_ohm: 100_000.0,
            forbidden_patient_flags,
            required_confirmations,
            require_isolation_confirmed: true,
            min_isolation_resistance_ohm: 1_000_000.0,
        }
    }
}

/// Reject non-finite or out-of-range amplitude/offset/total-voltage.
///
/// Checks run in order and return on the first violation:
/// finiteness/sign, amplitude ceiling, offset ceiling, total-voltage ceiling.
pub fn assert_safe_output(amp_vpp: f64, offset_v: f64, limits: &SafetyLimits) -> Result<(), SafetyFault> {
    if !amp_vpp.is_finite() {
        return Err(SafetyFault::ParameterNotFinite {
            parameter: "amp_vpp".into(),
        });
    }
    if !offset_v.is_finite() {
        return Err(SafetyFault::ParameterNotFinite {
            parameter: "offset_v".into(),
        });
    }
    if amp_vpp < 0.0 {
        return Err(SafetyFault::AmplitudeInvalid {
            detail: format!("amp_vpp must be >= 0, got {amp_vpp}"),
        });
    }
    if amp_vpp > limits.max_amp_vpp {
        return Err(SafetyFault::AmplitudeExceedsMax {
            amp_vpp,
            max: limits.max_amp_vpp,
        });
    }
    if offset_v.abs() > limits.max_offset_v {
        return Err(SafetyFault::OffsetExceedsMax {
            offset_v,
            max: limits.max_offset_v,
        });
    }
    let high = (amp_vpp / 2.0 + offset_v).abs();
    let low = (-amp_vpp / 2.0 + offset_v).abs();
    let total = high.max(low);
    if total > limits.max_total_voltage {
        return Err(SafetyFault::TotalVoltageExceedsMax {
            total,
            max: limits.max_total_voltage,
        });
    }
    Ok(())
}

/// Reject non-finite, non-positive, or out-of-range frequencies.
pub fn validate_frequency(hz: f64, limits: &SafetyLimits) -> Result<(), SafetyFault> {
    if !hz.is_finite() {
        return Err(SafetyFault::ParameterNotFinite { parameter: "hz".into() });
    }
    if hz <= 0.0 {
        return Err(SafetyFault::FrequencyInvalid {
            detail: format!("hz must be > 0, got {hz}"),
        });
    }
    if hz < limits.min_frequency_hz {
        return Err(SafetyFault::FrequencyBelowMin {
            hz,
            min: limits.min_frequency_hz,
        });
    }
    if hz > limits.max_frequency_hz {
        return Err(SafetyFault::FrequencyAboveMax {
            hz,
            max: limits.max_frequency_hz,
        });
    }
    Ok(())
}

/// Reject non-positive or overlong session durations.
pub fn validate_session_duration(minutes: f64, limits: &SafetyLimits) -> Result<(), SafetyFault> {
    if !minutes.is_finite() {
        return Err(SafetyFault::ParameterNotFinite {
            parameter: "minutes".into(),
        });
    }
    if minutes <= 0.0 {
        return Err(SafetyFault::DurationInvalid {
            detail: format!("minutes must be > 0, got {minutes}"),
        });
    }
    if minutes > limits.max_session_duration_min {
        return Err(SafetyFault::DurationExceedsMax {
            minutes,
            max: limits.max_session_duration_min,
        });
    }
    Ok(())
}

/// Return one `PatientContraindicated` fault per blocking flag whose patient
/// value coerces to truthy. Flags absent from `patient` are treated as falsy.
pub fn check_patient_flags(
    patient: &HashMap<String, PatientValue>,
    limits: &SafetyLimits,
) -> Vec<SafetyFault> {
    limits
        .forbidden_patient_flags
        .iter()
        .filter(|(_, blocking)| *blocking)
        .filter_map(|(flag, _)| {
            patient
                .get(flag)
                .filter(|v| v.is_truthy())
                .map(|_| SafetyFault::PatientContraindicated { flag: flag.clone() })
        })
        .collect()
}

/// Return one `ConfirmationMissing` fault per required key that is absent or `false`.
pub fn require_confirmations(
    confirmations: &HashMap<String, bool>,
    limits: &SafetyLimits,
) -> Result<(), Vec<SafetyFault>> {
    let missing: Vec<SafetyFault> = limits
        .required_confirmations
        .iter()
        .filter(|key| !confirmations.get(*key).copied().unwrap_or(false))
        .map(|key| SafetyFault::ConfirmationMissing { key: key.clone() })
        .collect();
    if missing.is_empty() { Ok(()) } else { Err(missing) }
}

/// Run every check and aggregate every fault found across all five
/// categories into one `Vec`, rather than stopping at the first failing
/// category.
///
/// This deliberately diverges from `original_source/biodesk/quantum/safety.py`'s
/// `comprehensive_check`, which raises on the first failing category; the
/// *ordering* of which category runs first (amplitude/offset -> frequency ->
/// patient flags -> confirmations) is preserved so diagnostic output reads in
/// the same order an operator would have seen historically.
#[allow(clippy::too_many_arguments)]
pub fn comprehensive_check(
    amp_vpp: f64,
    offset_v: f64,
    hz: f64,
    patient: &HashMap<String, PatientValue>,
    confirmations: &HashMap<String, bool>,
    limits: &SafetyLimits,
) -> Result<(), Vec<SafetyFault>> {
    let mut faults = Vec::new();

    if let Err(f) = assert_safe_output(amp_vpp, offset_v, limits) {
        faults.push(f);
    }
    if let Err(f) = validate_frequency(hz, limits) {
        faults.push(f);
    }
    faults.extend(check_patient_flags(patient, limits));
    if let Err(mut fs) = require_confirmations(confirmations, limits) {
        faults.append(&mut fs);
    }

    if faults.is_empty() { Ok(()) } else { Err(faults) }
}
