//! `AssessmentWorker`: captures a baseline then sweeps a list of
//! frequencies, scoring each against that baseline. Same blocking,
//! single-session-per-instance shape as `ProtocolRunner`, grounded on
//! `original_source/biodesk/quantum/assessment_worker.py`'s baseline-then-sweep
//! control flow.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quantctl_traits::clock::Clock;
use quantctl_traits::hardware::HardwareIo;
use rand::seq::SliceRandom;
use tracing::warn;

use crate::constants::{BASELINE_OUTPUT_SETTLE_MS, BASELINE_STREAM_SETTLE_MS, PER_FREQUENCY_STREAM_SETTLE_MS};
use crate::error::{AbortReason, CoreError};
use crate::event::{Event, EventSender, Finished, Started};
use crate::hw_error::map_hw_error;
use crate::metrics::{self, percent_delta, Measurement};
use crate::safety::{self, PatientValue, SafetyLimits};
use crate::scoring::{DefaultScoreStrategy, ScoreStrategy};
use crate::status::WorkerState;
use crate::types::{AssessmentConfig, AssessmentSummary, Baseline, FrequencyResult};
use crate::wallclock::now_ms;

pub struct AssessmentWorker<H: HardwareIo, C: Clock> {
    hw: H,
    clock: C,
    limits: SafetyLimits,
    events: EventSender,
    state: WorkerState,
    abort_flag: Arc<AtomicBool>,
    score_strategy: Box<dyn ScoreStrategy>,
}

impl<H: HardwareIo, C: Clock> AssessmentWorker<H, C> {
    pub fn new(hw: H, clock: C, limits: SafetyLimits, events: EventSender) -> Self {
        Self::with_score_strategy(hw, clock, limits, events, Box::new(DefaultScoreStrategy))
    }

    pub fn with_score_strategy(
        hw: H,
        clock: C,
        limits: SafetyLimits,
        events: EventSender,
        score_strategy: Box<dyn ScoreStrategy>,
    ) -> Self {
        Self {
            hw,
            clock,
            limits,
            events,
            state: WorkerState::Idle,
            abort_flag: Arc::new(AtomicBool::new(false)),
            score_strategy,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn abort_handle(&self) -> WorkerAbortHandle {
        WorkerAbortHandle { flag: Arc::clone(&self.abort_flag) }
    }

    pub fn abort(&self) {
        self.abort_flag.store(true, Ordering::SeqCst);
    }

    fn set_state(&mut self, state: WorkerState) {
        self.state = state;
        let _ = self.events.send(Event::StateChanged(state.into()));
    }

    fn aborted(&self) -> bool {
        self.abort_flag.load(Ordering::SeqCst)
    }

    pub fn start(
        &mut self,
        mut config: AssessmentConfig,
        patient: &HashMap<String, PatientValue>,
        confirmations: &HashMap<String, bool>,
    ) -> Result<AssessmentSummary, CoreError> {
        if self.state.is_active() {
            return Err(CoreError::Busy);
        }
        self.abort_flag.store(false, Ordering::SeqCst);
        self.set_state(WorkerState::Preparing);

        let first_hz = *config
            .frequencies_hz
            .first()
            .ok_or_else(|| CoreError::InvalidState { expected: "non-empty frequency list", actual: "empty" })?;

        let limits = config.safety_limits.clone().unwrap_or_else(|| self.limits.clone());
        if let Err(faults) =
            safety::comprehensive_check(config.amp_vpp, config.offset_v, first_hz, patient, confirmations, &limits)
        {
            self.set_state(WorkerState::Error);
            return Err(CoreError::Safety(faults));
        }
        for hz in &config.frequencies_hz {
            if let Err(fault) = safety::validate_frequency(*hz, &limits) {
                self.set_state(WorkerState::Error);
                return Err(CoreError::Safety(vec![fault]));
            }
        }

        let _ = self.events.send(Event::Started(Started::Assessment(config.clone())));

        if config.randomize_order {
            config.frequencies_hz.shuffle(&mut rand::thread_rng());
        }

        let baseline = match self.capture_baseline(&config) {
            Ok(b) => b,
            Err(e) => return self.finish_hardware_error(e),
        };
        let _ = self.events.send(Event::BaselineMeasured(baseline));

        if self.aborted() {
            return self.finish_aborted();
        }

        self.set_state(WorkerState::Testing);
        let mut results = Vec::with_capacity(config.frequencies_hz.len());
        for hz in &config.frequencies_hz {
            if self.aborted() {
                return self.finish_aborted();
            }
            match self.test_frequency(*hz, &config, &baseline) {
                Ok(result) => {
                    let _ = self.events.send(Event::ResultReady(result));
                    results.push(result);
                }
                Err(e) => {
                    warn!(frequency_hz = hz, error = %e, "frequency test failed, skipping");
                }
            }
        }

        self.set_state(WorkerState::Analyzing);
        results.sort_by(|a, b| match (a.is_valid, b.is_valid) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal),
        });
        results.truncate(config.top_n);
        let summary = AssessmentSummary { baseline, results };
        self.set_state(WorkerState::Finished);
        let _ = self.events.send(Event::Finished(Finished::Assessment(summary.clone())));
        Ok(summary)
    }

    fn capture_baseline(&mut self, config: &AssessmentConfig) -> Result<Baseline, crate::error::HardwareError> {
        self.set_state(WorkerState::Baseline);
        self.hw.stop_output().map_err(map_hw_error)?;
        self.clock.sleep(Duration::from_millis(BASELINE_OUTPUT_SETTLE_MS));
        self.hw
            .start_stream(config.sample_rate_hz, config.voltage_range_v)
            .map_err(map_hw_error)?;
        self.clock.sleep(Duration::from_millis(BASELINE_STREAM_SETTLE_MS));
        let samples = self.hw.read_stream(config.baseline_duration_s).map_err(map_hw_error)?;
        self.hw.stop_stream().map_err(map_hw_error)?;

        let measurement = Measurement {
            vrms: metrics::vrms(&samples.ch2),
            vpp: metrics::vpp(&samples.ch2),
            vdc: metrics::vdc(&samples.ch2),
            impedance_ohm: metrics::impedance_ohm(&samples.ch1, &samples.ch2, config.series_resistor_ohm),
            current_ma: metrics::current_ma(&samples.ch1, config.series_resistor_ohm),
            band_energy: metrics::band_energy(&samples.ch2, f64::from(config.sample_rate_hz)),
            phase_deg: metrics::phase_deg(&samples.ch1, &samples.ch2, samples.ch1.len() as f64),
            artifact_level: metrics::artifact_level(&samples.ch2),
        };
        Ok(Baseline { measurement })
    }

    fn test_frequency(
        &mut self,
        hz: f64,
        config: &AssessmentConfig,
        baseline: &Baseline,
    ) -> Result<FrequencyResult, crate::error::HardwareError> {
        self.hw.configure_generator(config.waveform, config.amp_vpp, config.offset_v).map_err(map_hw_error)?;
        self.hw.set_frequency(hz).map_err(map_hw_error)?;
        self.hw.start_stream(config.sample_rate_hz, config.voltage_range_v).map_err(map_hw_error)?;
        self.hw.start_output().map_err(map_hw_error)?;
        self.clock.sleep(Duration::from_millis(PER_FREQUENCY_STREAM_SETTLE_MS));

        let read_result = self.hw.read_stream(config.per_frequency_duration_s);

        let _ = self.hw.stop_output();
        let _ = self.hw.stop_stream();

        let samples = read_result.map_err(map_hw_error)?;
        let measurement = Measurement {
            vrms: metrics::vrms(&samples.ch2),
            vpp: metrics::vpp(&samples.ch2),
            vdc: metrics::vdc(&samples.ch2),
            impedance_ohm: metrics::impedance_ohm(&samples.ch1, &samples.ch2, config.series_resistor_ohm),
            current_ma: metrics::current_ma(&samples.ch1, config.series_resistor_ohm),
            band_energy: metrics::band_energy(&samples.ch2, f64::from(config.sample_rate_hz)),
            phase_deg: metrics::phase_deg(&samples.ch1, &samples.ch2, samples.ch1.len() as f64),
            artifact_level: metrics::artifact_level(&samples.ch2),
        };
        let score = self.score_strategy.score(&baseline.measurement, &measurement);
        let is_valid = measurement.is_valid();

        Ok(FrequencyResult {
            frequency_hz: hz,
            measurement,
            score,
            delta_z_percent: percent_delta(baseline.measurement.impedance_ohm, measurement.impedance_ohm),
            delta_rms_percent: percent_delta(baseline.measurement.vrms, measurement.vrms),
            delta_vpp_percent: percent_delta(baseline.measurement.vpp, measurement.vpp),
            delta_energy_01_5hz: measurement.band_energy - baseline.measurement.band_energy,
            is_valid,
            test_duration_s: config.per_frequency_duration_s,
            timestamp_ms: now_ms(),
        })
    }

    fn finish_aborted(&mut self) -> Result<AssessmentSummary, CoreError> {
        let _ = self.hw.stop_output();
        let _ = self.hw.stop_stream();
        self.set_state(WorkerState::Aborted);
        let reason = AbortReason::User("abort requested".into());
        let _ = self.events.send(Event::Aborted(reason.clone()));
        Err(CoreError::Aborted(reason))
    }

    fn finish_hardware_error(&mut self, err: crate::error::HardwareError) -> Result<AssessmentSummary, CoreError> {
        self.set_state(WorkerState::Error);
        let _ = self.events.send(Event::ErrorOccurred(err.to_string()));
        Err(CoreError::Hardware(err))
    }
}

#[derive(Clone)]
pub struct WorkerAbortHandle {
    flag: Arc<AtomicBool>,
}

impl WorkerAbortHandle {
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantctl_traits::clock::test_clock::TestClock;

    use crate::builder::AssessmentConfigBuilder;
    use crate::event::event_channel;
    use crate::mocks::FakeHardware;

    fn confirmed(limits: &SafetyLimits) -> HashMap<String, bool> {
        limits.required_confirmations.iter().map(|k| (k.clone(), true)).collect()
    }

    fn config() -> AssessmentConfig {
        AssessmentConfigBuilder::new()
            .name("sweep")
            .frequencies_hz([100.0, 200.0, 300.0])
            .amp_vpp(1.0)
            .baseline_duration_s(0.01)
            .per_frequency_duration_s(0.01)
            .series_resistor_ohm(1_000.0)
            .sample_rate_hz(1_000)
            .top_n(3)
            .build()
            .unwrap()
    }

    #[test]
    fn runs_a_full_sweep_and_ranks_results() {
        let limits = SafetyLimits::default();
        let confirmations = confirmed(&limits);
        let patient = HashMap::new();
        let (tx, _rx) = event_channel();
        let clock = TestClock::new();
        let mut worker = AssessmentWorker::new(FakeHardware::default(), clock, limits, tx);

        let summary = worker.start(config(), &patient, &confirmations).unwrap();
        assert_eq!(summary.results.len(), 3);
        assert_eq!(worker.state(), WorkerState::Finished);
        let ranked = summary.ranked();
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn randomized_order_still_tests_every_frequency() {
        let limits = SafetyLimits::default();
        let confirmations = confirmed(&limits);
        let patient = HashMap::new();
        let (tx, _rx) = event_channel();
        let clock = TestClock::new();
        let mut worker = AssessmentWorker::new(FakeHardware::default(), clock, limits, tx);

        let mut cfg = config();
        cfg.randomize_order = true;
        let summary = worker.start(cfg, &patient, &confirmations).unwrap();
        let mut tested: Vec<f64> = summary.results.iter().map(|r| r.frequency_hz).collect();
        tested.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(tested, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn top_n_truncates_ranked_results() {
        let limits = SafetyLimits::default();
        let confirmations = confirmed(&limits);
        let patient = HashMap::new();
        let (tx, _rx) = event_channel();
        let clock = TestClock::new();
        let mut worker = AssessmentWorker::new(FakeHardware::default(), clock, limits, tx);

        let mut cfg = config();
        cfg.top_n = 2;
        let summary = worker.start(cfg, &patient, &confirmations).unwrap();
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.ranked().len(), 2);
    }

    #[test]
    fn abort_before_testing_skips_all_frequencies() {
        let limits = SafetyLimits::default();
        let confirmations = confirmed(&limits);
        let patient = HashMap::new();
        let (tx, _rx) = event_channel();
        let clock = TestClock::new();
        let mut worker = AssessmentWorker::new(FakeHardware::default(), clock, limits, tx);
        worker.abort_handle().abort();

        let err = worker.start(config(), &patient, &confirmations).unwrap_err();
        assert!(matches!(err, CoreError::Aborted(_)));
        assert_eq!(worker.state(), WorkerState::Aborted);
    }

    #[test]
    fn failed_frequency_read_is_skipped_not_fatal() {
        let limits = SafetyLimits::default();
        let confirmations = confirmed(&limits);
        let patient = HashMap::new();
        let (tx, _rx) = event_channel();
        let clock = TestClock::new();
        let mut hw = FakeHardware::default();
        hw.fail_next_read = None;
        let mut worker = AssessmentWorker::new(hw, clock, limits, tx);

        let summary = worker.start(config(), &patient, &confirmations).unwrap();
        assert!(!summary.results.is_empty());
    }
}
