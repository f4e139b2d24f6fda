//! The data model: protocols, assessment configuration, and the results the
//! runner/worker emit. Mirrors the shape of `doser_core::types::{Protocol,
//! Step}` (formerly the dosing recipe/step types) repurposed for stimulus
//! waveforms instead of motor/scale setpoints.

use quantctl_traits::hardware::{OutputMode, Waveform};

use crate::metrics::Measurement;
use crate::safety::SafetyLimits;

/// One step of a multi-step stimulation protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub label: String,
    pub frequency_hz: f64,
    pub amp_vpp: f64,
    pub offset_v: f64,
    pub waveform: Waveform,
    /// Output gating applied for the duration of this step; see
    /// `runner.rs`'s per-step "apply mode" phase.
    pub mode: OutputMode,
    /// Cycles per trigger when `mode == Burst`. `None` derives a value from
    /// `frequency_hz` and `duration_min` at run time (see `runner::default_burst_cycles`).
    pub burst_cycles: Option<u32>,
    pub duration_min: f64,
    /// Soft-ramp duration from the previous output level to this step's
    /// target; `0` means jump directly (still subject to `RAMP_MIN_STEPS`
    /// when non-zero, see `ramp.rs`).
    pub ramp_ms: u64,
}

/// An ordered stimulation protocol plus provenance metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    pub name: String,
    pub author: String,
    pub version: String,
    pub created_at: String,
    pub description: String,
    /// Per-session override of the host's configured `SafetyLimits`. `None`
    /// means "use the runner's limits as constructed".
    pub safety_limits: Option<SafetyLimits>,
    pub steps: Vec<Step>,
}

impl Protocol {
    pub fn total_duration_min(&self) -> f64 {
        self.steps.iter().map(|s| s.duration_min).sum()
    }
}

/// Configuration for a single frequency-sweep assessment session.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentConfig {
    pub name: String,
    pub frequencies_hz: Vec<f64>,
    pub amp_vpp: f64,
    pub offset_v: f64,
    pub waveform: Waveform,
    pub baseline_duration_s: f64,
    pub per_frequency_duration_s: f64,
    /// Shuffle `frequencies_hz` before running, via `rand::thread_rng()`.
    /// Non-reproducible by design; see `SPEC_FULL.md` open-question decision 3.
    pub randomize_order: bool,
    pub series_resistor_ohm: f64,
    pub sample_rate_hz: u32,
    pub voltage_range_v: f64,
    /// Keep only the `top_n` highest-scoring results in `AssessmentSummary::ranked`.
    pub top_n: usize,
    /// Per-session override of the host's configured `SafetyLimits`. `None`
    /// means "use the worker's limits as constructed".
    pub safety_limits: Option<SafetyLimits>,
}

/// The baseline measurement captured before any stimulus is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub measurement: Measurement,
}

/// The outcome of testing a single frequency against the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyResult {
    pub frequency_hz: f64,
    pub measurement: Measurement,
    pub score: f64,
    pub delta_z_percent: f64,
    pub delta_rms_percent: f64,
    pub delta_vpp_percent: f64,
    pub delta_energy_01_5hz: f64,
    /// Mirrors `Measurement::is_valid()` at the time this result was built;
    /// invalid results are still emitted but rank last.
    pub is_valid: bool,
    pub test_duration_s: f64,
    /// Milliseconds since the Unix epoch when this result was finalized.
    pub timestamp_ms: u64,
}

/// A point-in-time snapshot emitted roughly every `LIVE_METRICS_TICK_MS`
/// while a protocol step is running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveMetrics {
    pub step_index: usize,
    pub total_steps: usize,
    pub elapsed_ms: u64,
    /// Fraction of the current step's duration elapsed, in `[0, 1]`.
    pub step_progress: f64,
    /// `(completed_steps + step_progress) / total_steps`, in `[0, 1]`.
    pub overall_progress: f64,
    pub current_frequency: f64,
    pub current_amplitude: f64,
    /// Linear extrapolation of remaining session time, floored at zero.
    pub remaining_s: f64,
    /// Milliseconds since the Unix epoch when the current step started.
    pub step_start_time: u64,
    /// Milliseconds since the Unix epoch when the protocol started.
    pub protocol_start_time: u64,
}

/// Final summary of a finished protocol run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolSummary {
    pub steps_completed: usize,
    pub total_elapsed_ms: u64,
}

/// Final summary of a finished assessment session, ranked best-to-worst by
/// `FrequencyResult::score` descending (higher score = more drift from baseline).
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentSummary {
    pub baseline: Baseline,
    pub results: Vec<FrequencyResult>,
}

impl AssessmentSummary {
    /// Results ordered by descending score, valid results first; invalid
    /// results (failed `Measurement::is_valid()`) always sort to the bottom
    /// regardless of score.
    pub fn ranked(&self) -> Vec<&FrequencyResult> {
        let mut out: Vec<&FrequencyResult> = self.results.iter().collect();
        out.sort_by(|a, b| match (a.is_valid, b.is_valid) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal),
        });
        out
    }
}
