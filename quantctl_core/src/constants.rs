//! Named constants pinned from the source's empirical thresholds.
//!
//! These appear only as bare numbers in `original_source/biodesk/quantum/*.py`;
//! exposing them here keeps the numeric contract visible and grep-able instead
//! of scattered through `metrics.rs`/`worker.rs`.

/// `is_valid` rejects any measurement whose `artifact_level` exceeds this.
pub const ARTIFACT_LEVEL_MAX: f64 = 100.0;

/// `is_valid` accepts impedance only within this inclusive range, in ohms.
pub const VALID_IMPEDANCE_RANGE_OHM: std::ops::RangeInclusive<f64> = 100.0..=10_000_000.0;

/// `is_valid` rejects a patient-channel RMS below this (1 microvolt).
pub const VALID_VRMS_PATIENT_MIN_V: f64 = 1e-6;

/// Below this shunt-channel RMS, impedance is reported as `+inf` (open/bad contact).
pub const SHUNT_VRMS_OPEN_THRESHOLD_V: f64 = 1e-6;

/// `composite_score` linear-combination coefficients, in the exact order the
/// source applies them: `1.5*|dz%| + 1.0*|drms%| + 0.5*|dvpp%| - 0.3*artifact`.
pub const SCORE_COEFF_DELTA_Z: f64 = 1.5;
pub const SCORE_COEFF_DELTA_RMS: f64 = 1.0;
pub const SCORE_COEFF_DELTA_VPP: f64 = 0.5;
pub const SCORE_COEFF_ARTIFACT: f64 = -0.3;

/// Reference band-energy window, in Hz.
pub const REFERENCE_BAND_HZ: (f64, f64) = (0.1, 5.0);

/// Minimum number of linear increments a soft-ramp must take, regardless of
/// `ramp_ms`.
pub const RAMP_MIN_STEPS: u32 = 20;

/// Gap between consecutive protocol steps.
pub const INTER_STEP_GAP_MS: u64 = 100;

/// `LiveMetrics` recomputation/emission cadence while a protocol step runs.
pub const LIVE_METRICS_TICK_MS: u64 = 100;

/// Settling delay after `stop_output()` before baseline capture starts streaming.
pub const BASELINE_OUTPUT_SETTLE_MS: u64 = 500;

/// Settling delay after `start_stream()` before baseline capture reads.
pub const BASELINE_STREAM_SETTLE_MS: u64 = 500;

/// Settling delay after `start_stream()` before a per-frequency test starts output.
pub const PER_FREQUENCY_STREAM_SETTLE_MS: u64 = 200;

/// Extra margin added on top of the requested window when waiting on `read_stream`.
pub const READ_DEADLINE_MARGIN_S: f64 = 1.0;
