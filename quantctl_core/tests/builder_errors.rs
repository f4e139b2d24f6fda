use quantctl_core::{BuildError, StepBuilder};
use rstest::rstest;

#[rstest]
#[case(0.0, 1.0, 1.0, "frequency_hz")]
#[case(100.0, 0.0, 1.0, "amp_vpp")]
#[case(100.0, 1.0, 0.0, "duration_min")]
fn step_builder_rejects_non_positive_fields(
    #[case] frequency_hz: f64,
    #[case] amp_vpp: f64,
    #[case] duration_min: f64,
    #[case] expected_field: &str,
) {
    let err = StepBuilder::new()
        .frequency_hz(frequency_hz)
        .amp_vpp(amp_vpp)
        .duration_min(duration_min)
        .build()
        .unwrap_err();
    match err {
        BuildError::NotPositive { field, .. } => assert_eq!(field, expected_field),
        other => panic!("expected NotPositive for {expected_field}, got {other:?}"),
    }
}
