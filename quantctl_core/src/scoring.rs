//! Pluggable ranking strategy, mirroring `doser_core::dosing_strategy::DosingStrategy`'s
//! role as the one seam the host is expected to swap out.

use crate::metrics::{composite_score, Measurement};

/// Scores how far a test measurement has drifted from the baseline. Higher
/// means more drift from baseline, so `AssessmentSummary::ranked` puts the
/// highest scores first: those are the frequencies most worth investigating.
pub trait ScoreStrategy: Send + Sync {
    fn score(&self, baseline: &Measurement, test: &Measurement) -> f64;
}

/// The fixed linear-combination scorer: `1.5*|dz%| + 1.0*|drms%| + 0.5*|dvpp%| - 0.3*artifact`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScoreStrategy;

impl ScoreStrategy for DefaultScoreStrategy {
    fn score(&self, baseline: &Measurement, test: &Measurement) -> f64 {
        composite_score(baseline, test)
    }
}
