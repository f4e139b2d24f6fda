//! Example: Custom Scoring Strategy

use quantctl_core::scoring::ScoreStrategy;
use quantctl_core::Measurement;

pub struct ImpedanceOnlyStrategy;

impl ScoreStrategy for ImpedanceOnlyStrategy {
    fn score(&self, baseline: &Measurement, test: &Measurement) -> f64 {
        (test.impedance_ohm - baseline.impedance_ohm).abs() / baseline.impedance_ohm.max(1.0)
    }
}
