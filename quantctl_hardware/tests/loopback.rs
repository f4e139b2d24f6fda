use quantctl_hardware::LoopbackHardware;
use quantctl_traits::hardware::{HardwareIo, Waveform};

#[test]
fn full_session_lifecycle_round_trips() {
    let mut hw = LoopbackHardware::new();
    assert!(hw.is_connected());

    hw.configure_generator(Waveform::Sine, 4.0, 0.5).unwrap();
    hw.set_frequency(1_000.0).unwrap();
    hw.start_stream(10_000, 5.0).unwrap();
    hw.start_output().unwrap();

    let samples = hw.read_stream(0.05).unwrap();
    assert_eq!(samples.ch1.len(), samples.ch2.len());
    assert!(!samples.ch1.is_empty());

    hw.stop_output().unwrap();
    hw.stop_stream().unwrap();
}

#[test]
fn reconfiguring_frequency_changes_cycle_count() {
    let mut hw = LoopbackHardware::new();
    hw.configure_generator(Waveform::Sine, 2.0, 0.0).unwrap();
    hw.start_output().unwrap();
    hw.start_stream(10_000, 5.0).unwrap();

    hw.set_frequency(10.0).unwrap();
    let low = hw.read_stream(0.1).unwrap();
    hw.set_frequency(500.0).unwrap();
    let high = hw.read_stream(0.1).unwrap();

    let zero_crossings = |samples: &[f64]| {
        samples
            .windows(2)
            .filter(|w| w[0].signum() != w[1].signum())
            .count()
    };
    assert!(zero_crossings(&high.ch2) > zero_crossings(&low.ch2));
}

#[test]
fn square_and_triangle_waveforms_stay_within_amplitude_bounds() {
    for waveform in [Waveform::Square, Waveform::Triangle, Waveform::Arbitrary] {
        let mut hw = LoopbackHardware::new();
        hw.configure_generator(waveform, 6.0, 1.0).unwrap();
        hw.set_frequency(60.0).unwrap();
        hw.start_output().unwrap();
        hw.start_stream(5_000, 10.0).unwrap();
        let samples = hw.read_stream(0.1).unwrap();
        for v in samples.ch2 {
            assert!(v >= 1.0 - 3.0 - 1e-9 && v <= 1.0 + 3.0 + 1e-9, "sample {v} out of bounds");
        }
    }
}

#[test]
fn stopping_stream_then_reading_is_rejected() {
    let mut hw = LoopbackHardware::new();
    hw.start_stream(1_000, 5.0).unwrap();
    hw.stop_stream().unwrap();
    assert!(hw.read_stream(0.01).is_err());
}
