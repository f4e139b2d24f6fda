use proptest::prelude::*;
use quantctl_core::safety::{assert_safe_output, validate_frequency, SafetyLimits};

proptest! {
    #[test]
    fn amplitude_within_limits_is_always_accepted(
        amp in 0.0f64..=2.0,
        offset in -0.25f64..=0.25,
    ) {
        let limits = SafetyLimits::default();
        prop_assert!(assert_safe_output(amp, offset, &limits).is_ok());
    }

    #[test]
    fn amplitude_past_ceiling_is_always_rejected(amp in 2.01f64..100.0) {
        let limits = SafetyLimits::default();
        prop_assert!(assert_safe_output(amp, 0.0, &limits).is_err());
    }

    #[test]
    fn frequency_within_range_is_always_accepted(hz in 0.1f64..=100_000.0) {
        let limits = SafetyLimits::default();
        prop_assert!(validate_frequency(hz, &limits).is_ok());
    }

    #[test]
    fn non_finite_frequency_is_never_accepted(hz in prop::sample::select(vec![f64::NAN, f64::INFINITY, f64::NEG_INFINITY])) {
        let limits = SafetyLimits::default();
        prop_assert!(validate_frequency(hz, &limits).is_err());
    }
}
