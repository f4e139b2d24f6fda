use std::collections::HashMap;

use quantctl_core::{
    event_channel, AssessmentConfigBuilder, AssessmentWorker, CoreError, Event, ProtocolBuilder, ProtocolRunner,
    RunnerState, SafetyLimits, StepBuilder, WorkerState,
};
use quantctl_traits::clock::test_clock::TestClock;
use quantctl_core::mocks::FakeHardware;

fn all_confirmed(limits: &SafetyLimits) -> HashMap<String, bool> {
    limits.required_confirmations.iter().map(|k| (k.clone(), true)).collect()
}

#[test]
fn two_step_protocol_happy_path_emits_events_in_order() {
    let limits = SafetyLimits::default();
    let confirmations = all_confirmed(&limits);
    let (tx, rx) = event_channel();
    let mut runner = ProtocolRunner::new(FakeHardware::default(), TestClock::new(), limits, tx);

    let step1 = StepBuilder::new().label("warm up").frequency_hz(100.0).amp_vpp(1.0).duration_min(0.01).build().unwrap();
    let step2 = StepBuilder::new().label("main").frequency_hz(250.0).amp_vpp(1.0).duration_min(0.01).build().unwrap();
    let protocol = ProtocolBuilder::new().name("demo").step(step1).step(step2).build().unwrap();

    let summary = runner.start(protocol, &HashMap::new(), &confirmations).expect("protocol should complete");
    assert_eq!(summary.steps_completed, 2);
    assert_eq!(runner.state(), RunnerState::Finished);

    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        kinds.push(std::mem::discriminant(&ev));
        if let Event::Finished(_) = ev {
            break;
        }
    }
    assert!(!kinds.is_empty());
}

#[test]
fn assessment_ranks_frequencies_by_deviation_from_baseline() {
    let limits = SafetyLimits::default();
    let confirmations = all_confirmed(&limits);
    let (tx, _rx) = event_channel();
    let mut worker = AssessmentWorker::new(FakeHardware::default(), TestClock::new(), limits, tx);

    let config = AssessmentConfigBuilder::new()
        .name("sweep")
        .frequencies_hz([50.0, 150.0, 300.0])
        .amp_vpp(1.0)
        .baseline_duration_s(0.01)
        .per_frequency_duration_s(0.01)
        .series_resistor_ohm(1_000.0)
        .sample_rate_hz(2_000)
        .build()
        .unwrap();

    let summary = worker.start(config, &HashMap::new(), &confirmations).expect("assessment should complete");
    assert_eq!(worker.state(), WorkerState::Finished);
    assert_eq!(summary.results.len(), 3);

    let ranked = summary.ranked();
    for pair in ranked.windows(2) {
        assert!(pair[0].score <= pair[1].score);
    }
}

#[test]
fn abort_mid_protocol_surfaces_as_aborted_error() {
    let limits = SafetyLimits::default();
    let confirmations = all_confirmed(&limits);
    let (tx, _rx) = event_channel();
    let mut runner = ProtocolRunner::new(FakeHardware::default(), TestClock::new(), limits, tx);
    runner.abort_handle().abort();

    let step = StepBuilder::new().frequency_hz(100.0).amp_vpp(1.0).duration_min(5.0).build().unwrap();
    let protocol = ProtocolBuilder::new().name("demo").step(step).build().unwrap();

    let err = runner.start(protocol, &HashMap::new(), &confirmations).unwrap_err();
    assert!(matches!(err, CoreError::Aborted(_)));
}
