//! Signal measurement: RMS/Vpp/Vdc, impedance, current, band energy, phase,
//! artifact level, and the composite ranking score used by the assessment
//! worker.
//!
//! All transforms here are plain functions over `&[f64]` windows, the same
//! shape `doser_core`'s filtering helpers took over raw scale samples, so
//! they are trivially unit-testable without any hardware or clock.

use crate::constants::{
    ARTIFACT_LEVEL_MAX, REFERENCE_BAND_HZ, SCORE_COEFF_ARTIFACT, SCORE_COEFF_DELTA_RMS,
    SCORE_COEFF_DELTA_VPP, SCORE_COEFF_DELTA_Z, SHUNT_VRMS_OPEN_THRESHOLD_V,
    VALID_IMPEDANCE_RANGE_OHM, VALID_VRMS_PATIENT_MIN_V,
};

/// One fully-derived measurement from a single acquisition window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub vrms: f64,
    pub vpp: f64,
    pub vdc: f64,
    pub impedance_ohm: f64,
    pub current_ma: f64,
    pub band_energy: f64,
    pub phase_deg: f64,
    pub artifact_level: f64,
}

impl Measurement {
    /// A measurement is valid only when every derived quantity lands in its
    /// physically-plausible range; see `original_source/biodesk/quantum/assessment_worker.py::_validate_measurement`.
    pub fn is_valid(&self) -> bool {
        self.vrms.is_finite()
            && self.vrms >= VALID_VRMS_PATIENT_MIN_V
            && self.vpp.is_finite()
            && self.vdc.is_finite()
            && self.impedance_ohm.is_finite()
            && VALID_IMPEDANCE_RANGE_OHM.contains(&self.impedance_ohm)
            && self.current_ma.is_finite()
            && self.artifact_level.is_finite()
            && self.artifact_level <= ARTIFACT_LEVEL_MAX
    }
}

pub fn vrms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|v| v * v).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

pub fn vpp(samples: &[f64]) -> f64 {
    match (
        samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        samples.iter().cloned().fold(f64::INFINITY, f64::min),
    ) {
        (max, min) if max.is_finite() && min.is_finite() => max - min,
        _ => 0.0,
    }
}

pub fn vdc(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Impedance from the shunt (CH1, across a known series resistor) and
/// patient (CH2) channels: `z = series_resistor_ohm * rms(ch2) / rms(ch1)`.
///
/// Reports `+inf` when the shunt RMS is at/below the open-circuit threshold
/// (broken lead or no patient contact) instead of dividing by a near-zero.
pub fn impedance_ohm(ch1: &[f64], ch2: &[f64], series_resistor_ohm: f64) -> f64 {
    let shunt_rms = vrms(ch1);
    if shunt_rms <= SHUNT_VRMS_OPEN_THRESHOLD_V {
        return f64::INFINITY;
    }
    series_resistor_ohm * vrms(ch2) / shunt_rms
}

/// Current through the patient path, in milliamps, derived from the shunt
/// channel: `i_ma = 1000 * rms(ch1) / series_resistor_ohm`.
pub fn current_ma(ch1: &[f64], series_resistor_ohm: f64) -> f64 {
    1000.0 * vrms(ch1) / series_resistor_ohm
}

/// Energy of `samples` in the `REFERENCE_BAND_HZ` window via a direct
/// (non-FFT) discrete Fourier sum. Window sizes here are small (a few hundred
/// samples per acquisition), so an O(n^2) DFT over the handful of bins the
/// reference band covers is simpler and plenty fast; pulling in an FFT crate
/// for this would be solving a problem we don't have.
pub fn band_energy(samples: &[f64], sample_rate_hz: f64) -> f64 {
    if samples.is_empty() || sample_rate_hz <= 0.0 {
        return 0.0;
    }
    let n = samples.len();
    let (lo_hz, hi_hz) = REFERENCE_BAND_HZ;
    let bin_hz = sample_rate_hz / n as f64;
    let lo_bin = (lo_hz / bin_hz).ceil().max(0.0) as usize;
    let hi_bin = ((hi_hz / bin_hz).floor() as usize).min(n / 2);

    let mut energy = 0.0;
    for k in lo_bin..=hi_bin.max(lo_bin) {
        if k > n / 2 {
            break;
        }
        let mut re = 0.0;
        let mut im = 0.0;
        for (t, &x) in samples.iter().enumerate() {
            let angle = -2.0 * std::f64::consts::PI * k as f64 * t as f64 / n as f64;
            re += x * angle.cos();
            im += x * angle.sin();
        }
        energy += re * re + im * im;
    }
    energy / (n as f64 * n as f64)
}

/// Phase difference between `ch1` and `ch2`, in degrees, via full
/// cross-correlation argmax: `phase_deg = (lag / len(ch1)) * 360`, normalized
/// into `(-180, 180]`. Resolution is one sample; no sub-sample interpolation
/// is performed, matching the source's coarse estimate.
pub fn phase_deg(ch1: &[f64], ch2: &[f64], period_samples: f64) -> f64 {
    if ch1.is_empty() || ch2.is_empty() || period_samples <= 0.0 {
        return 0.0;
    }
    let n = ch1.len().min(ch2.len());
    let max_lag = n as isize - 1;
    let mut best_lag = 0isize;
    let mut best_corr = f64::NEG_INFINITY;

    for lag in -max_lag..=max_lag {
        let mut corr = 0.0;
        for i in 0..n {
            let j = i as isize + lag;
            if j >= 0 && (j as usize) < n {
                corr += ch1[i] * ch2[j as usize];
            }
        }
        if corr > best_corr {
            best_corr = corr;
            best_lag = lag;
        }
    }

    normalize_phase_deg(360.0 * best_lag as f64 / period_samples)
}

/// Folds any real-valued degree measure into `(-180, 180]`, matching
/// `original_source/biodesk/quantum/assessment_worker.py::_calculate_phase_difference`'s
/// `while > 180: -= 360` / `while < -180: += 360` normalization.
fn normalize_phase_deg(deg: f64) -> f64 {
    let mut deg = deg % 360.0;
    if deg <= -180.0 {
        deg += 360.0;
    } else if deg > 180.0 {
        deg -= 360.0;
    }
    deg
}

/// Artifact score: `var(x)/(mean(|x|)+1e-10) + 10*spike_rate`, where
/// `spike_rate` is the fraction of samples whose magnitude sits more than 3
/// standard deviations from the window mean. Matches
/// `original_source/biodesk/quantum/assessment_worker.py::_calculate_artifact_level`.
pub fn artifact_level(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mean = vdc(samples);
    let variance =
        samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    let mean_abs = samples.iter().map(|v| v.abs()).sum::<f64>() / samples.len() as f64;
    let variance_norm = variance / (mean_abs + 1e-10);

    let std_dev = variance.sqrt();
    let spike_rate = if std_dev <= 0.0 {
        0.0
    } else {
        samples.iter().filter(|&&v| (v - mean).abs() > 3.0 * std_dev).count() as f64 / samples.len() as f64
    };

    variance_norm + 10.0 * spike_rate
}

/// Composite ranking score comparing a per-frequency measurement against the
/// baseline: `1.5*|dz%| + 1.0*|drms%| + 0.5*|dvpp%| - 0.3*artifact`.
///
/// Percentage deltas are relative to the baseline value; a baseline of
/// exactly zero treats the corresponding delta term as zero rather than
/// dividing by zero.
pub fn composite_score(baseline: &Measurement, test: &Measurement) -> f64 {
    let dz = percent_delta(baseline.impedance_ohm, test.impedance_ohm).abs();
    let drms = percent_delta(baseline.vrms, test.vrms).abs();
    let dvpp = percent_delta(baseline.vpp, test.vpp).abs();

    SCORE_COEFF_DELTA_Z * dz
        + SCORE_COEFF_DELTA_RMS * drms
        + SCORE_COEFF_DELTA_VPP * dvpp
        + SCORE_COEFF_ARTIFACT * test.artifact_level
}

/// Percent change of `now` relative to `base`; a zero baseline treats the
/// delta as zero rather than dividing by zero. Shared by `composite_score`
/// and every per-frequency `delta_*_percent` field the worker reports.
pub fn percent_delta(base: f64, now: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        100.0 * (now - base) / base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vrms_of_dc_equals_its_magnitude() {
        assert!((vrms(&[3.0, 3.0, 3.0]) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn vrms_of_empty_is_zero() {
        assert_eq!(vrms(&[]), 0.0);
    }

    #[test]
    fn vpp_spans_min_to_max() {
        assert!((vpp(&[-1.0, 0.5, 2.0, -0.3]) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn impedance_reports_infinity_on_open_shunt() {
        let ch1 = vec![0.0; 100];
        let ch2 = vec![1.0; 100];
        assert_eq!(impedance_ohm(&ch1, &ch2, 1_000.0), f64::INFINITY);
    }

    #[test]
    fn impedance_scales_with_series_resistor() {
        let ch1 = vec![1.0; 100];
        let ch2 = vec![2.0; 100];
        let z = impedance_ohm(&ch1, &ch2, 1_000.0);
        assert!((z - 2_000.0).abs() < 1e-6);
    }

    #[test]
    fn score_of_identical_measurements_is_zero() {
        let m = Measurement {
            vrms: 1.0,
            vpp: 2.0,
            vdc: 0.0,
            impedance_ohm: 1_000.0,
            current_ma: 1.0,
            band_energy: 0.0,
            phase_deg: 0.0,
            artifact_level: 0.0,
        };
        assert_eq!(composite_score(&m, &m), 0.0);
    }

    #[test]
    fn score_matches_worked_example() {
        let baseline = Measurement {
            vrms: 1.0,
            vpp: 2.0,
            vdc: 0.0,
            impedance_ohm: 1_000.0,
            current_ma: 1.0,
            band_energy: 0.0,
            phase_deg: 0.0,
            artifact_level: 0.0,
        };
        let test = Measurement {
            impedance_ohm: 1_200.0,
            ..baseline
        };
        // dz% = 20 -> 1.5 * 20 = 30
        assert!((composite_score(&baseline, &test) - 30.0).abs() < 1e-9);

        let test2 = Measurement {
            impedance_ohm: 1_100.0,
            ..baseline
        };
        // dz% = 10 -> 1.5 * 10 = 15... but drms/dvpp unchanged so only dz contributes
        assert!((composite_score(&baseline, &test2) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn measurement_validity_rejects_out_of_range_impedance() {
        let m = Measurement {
            vrms: 1e-3,
            vpp: 1.0,
            vdc: 0.0,
            impedance_ohm: 50.0,
            current_ma: 1.0,
            band_energy: 0.0,
            phase_deg: 0.0,
            artifact_level: 0.0,
        };
        assert!(!m.is_valid());
    }

    #[test]
    fn artifact_level_combines_variance_and_spike_terms() {
        assert_eq!(artifact_level(&[1.0]), 0.0);
        let samples = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 50.0];
        let level = artifact_level(&samples);
        // variance_norm alone (no 3-sigma spikes, one outlier too few samples to
        // dominate mean) is already positive; the spike term only adds on top.
        assert!(level > 0.0);
    }

    #[test]
    fn phase_deg_is_zero_for_identical_channels() {
        let ch = vec![0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0];
        assert!((phase_deg(&ch, &ch, ch.len() as f64)).abs() < 1e-9);
    }

    #[test]
    fn phase_deg_normalizes_into_plus_minus_180() {
        assert!((normalize_phase_deg(270.0) - (-90.0)).abs() < 1e-9);
        assert!((normalize_phase_deg(-270.0) - 90.0).abs() < 1e-9);
        assert!((normalize_phase_deg(180.0) - 180.0).abs() < 1e-9);
        assert!((normalize_phase_deg(-180.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn measurement_validity_rejects_excess_artifact() {
        let m = Measurement {
            vrms: 1e-3,
            vpp: 1.0,
            vdc: 0.0,
            impedance_ohm: 1_000.0,
            current_ma: 1.0,
            band_energy: 0.0,
            phase_deg: 0.0,
            artifact_level: 150.0,
        };
        assert!(!m.is_valid());
    }
}
