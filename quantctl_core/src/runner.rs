//! `ProtocolRunner`: drives a multi-step stimulation `Protocol` to
//! completion against a `HardwareIo`, the same blocking-call-from-a-worker-
//! thread shape `doser_core::Sampler` used to drive a dosing run, reporting
//! progress through an `EventSender` and observing an `Arc<AtomicBool>`
//! abort flag between steps.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quantctl_traits::clock::Clock;
use quantctl_traits::hardware::{HardwareIo, OutputMode};
use tracing::{info, warn};

use crate::constants::{INTER_STEP_GAP_MS, LIVE_METRICS_TICK_MS};
use crate::error::{AbortReason, CoreError};
use crate::event::{Event, EventSender, Finished, Started};
use crate::hw_error::map_hw_error;
use crate::ramp::soft_ramp;
use crate::safety::{self, PatientValue, SafetyLimits};
use crate::status::RunnerState;
use crate::types::{LiveMetrics, Protocol, ProtocolSummary, Step};
use crate::wallclock::now_ms;

/// Runs one `Protocol` at a time. Not reentrant: calling `start` while a
/// session is already active returns `CoreError::Busy`.
pub struct ProtocolRunner<H: HardwareIo, C: Clock> {
    hw: H,
    clock: C,
    limits: SafetyLimits,
    events: EventSender,
    state: RunnerState,
    abort_flag: Arc<AtomicBool>,
}

impl<H: HardwareIo, C: Clock> ProtocolRunner<H, C> {
    pub fn new(hw: H, clock: C, limits: SafetyLimits, events: EventSender) -> Self {
        Self {
            hw,
            clock,
            limits,
            events,
            state: RunnerState::Idle,
            abort_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// A clone-able handle the host can use to request an abort from another
    /// thread while `start` is running on this one.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle { flag: Arc::clone(&self.abort_flag) }
    }

    fn set_state(&mut self, state: RunnerState) {
        self.state = state;
        let _ = self.events.send(Event::StateChanged(state.into()));
    }

    /// Run `protocol` to completion (or abort/error), blocking the calling
    /// thread for the protocol's full duration.
    pub fn start(
        &mut self,
        protocol: Protocol,
        patient: &HashMap<String, PatientValue>,
        confirmations: &HashMap<String, bool>,
    ) -> Result<ProtocolSummary, CoreError> {
        if self.state.is_active() {
            return Err(CoreError::Busy);
        }
        self.abort_flag.store(false, Ordering::SeqCst);
        self.set_state(RunnerState::Preparing);

        let first = protocol
            .steps
            .first()
            .ok_or_else(|| CoreError::InvalidState { expected: "non-empty protocol", actual: "empty" })?;

        let limits = protocol.safety_limits.as_ref().unwrap_or(&self.limits);
        if let Err(faults) =
            safety::comprehensive_check(first.amp_vpp, first.offset_v, first.frequency_hz, patient, confirmations, limits)
        {
            self.set_state(RunnerState::Error);
            return Err(CoreError::Safety(faults));
        }

        let _ = self.events.send(Event::Started(Started::Protocol(protocol.clone())));
        self.set_state(RunnerState::Running);

        let total_steps = protocol.steps.len();
        let total_duration_ms = (protocol.total_duration_min() * 60_000.0).round() as u64;
        let protocol_start_time = now_ms();

        let mut prev_amp = 0.0;
        let mut prev_offset = 0.0;
        let mut steps_completed = 0usize;
        let mut total_elapsed_ms = 0u64;

        for (index, step) in protocol.steps.iter().enumerate() {
            if self.abort_flag.load(Ordering::SeqCst) {
                return self.finish_aborted(AbortReason::User("abort requested".into()), steps_completed, total_elapsed_ms);
            }

            let limits = protocol.safety_limits.as_ref().unwrap_or(&self.limits);
            if let Err(fault) = safety::assert_safe_output(step.amp_vpp, step.offset_v, limits) {
                self.set_state(RunnerState::Error);
                return Err(CoreError::Safety(vec![fault]));
            }
            if let Err(fault) = safety::validate_frequency(step.frequency_hz, limits) {
                self.set_state(RunnerState::Error);
                return Err(CoreError::Safety(vec![fault]));
            }

            let _ = self.events.send(Event::StepStarted { index, step: step.clone() });

            if let Err(e) = soft_ramp(
                &mut self.hw,
                &self.clock,
                step.waveform,
                prev_amp,
                prev_offset,
                step.amp_vpp,
                step.offset_v,
                step.ramp_ms,
            ) {
                return self.finish_hardware_error(map_hw_error(e), Some(index), steps_completed, total_elapsed_ms);
            }
            if let Err(e) = self.hw.set_frequency(step.frequency_hz) {
                return self.finish_hardware_error(map_hw_error(e), Some(index), steps_completed, total_elapsed_ms);
            }
            apply_output_mode(&mut self.hw, step);
            if let Err(e) = self.hw.start_output() {
                return self.finish_hardware_error(map_hw_error(e), Some(index), steps_completed, total_elapsed_ms);
            }

            let step_start_time = now_ms();
            let step_result = self.run_step_ticks(
                index,
                total_steps,
                step,
                &mut total_elapsed_ms,
                total_duration_ms,
                protocol_start_time,
                step_start_time,
            );
            match step_result {
                StepOutcome::Completed => {}
                StepOutcome::Aborted => {
                    let _ = self.hw.stop_output();
                    return self.finish_aborted(AbortReason::User("abort requested".into()), steps_completed, total_elapsed_ms);
                }
                StepOutcome::HardwareLost => {
                    let _ = self.hw.stop_output();
                    return self.finish_hardware_error(
                        crate::error::HardwareError::NotConnected,
                        Some(index),
                        steps_completed,
                        total_elapsed_ms,
                    );
                }
            }

            if let Err(e) = self.hw.stop_output() {
                return self.finish_hardware_error(map_hw_error(e), Some(index), steps_completed, total_elapsed_ms);
            }
            let _ = self.events.send(Event::StepFinished { index });
            steps_completed += 1;
            prev_amp = step.amp_vpp;
            prev_offset = step.offset_v;

            if index + 1 < protocol.steps.len() {
                self.clock.sleep(Duration::from_millis(INTER_STEP_GAP_MS));
                total_elapsed_ms += INTER_STEP_GAP_MS;
            }
        }

        let summary = ProtocolSummary { steps_completed, total_elapsed_ms };
        self.set_state(RunnerState::Finished);
        let _ = self.events.send(Event::Finished(Finished::Protocol(summary.clone())));
        info!(steps = summary.steps_completed, "protocol finished");
        Ok(summary)
    }

    pub fn abort(&self) {
        self.abort_flag.store(true, Ordering::SeqCst);
    }

    #[allow(clippy::too_many_arguments)]
    fn run_step_ticks(
        &mut self,
        index: usize,
        total_steps: usize,
        step: &Step,
        total_elapsed_ms: &mut u64,
        total_duration_ms: u64,
        protocol_start_time: u64,
        step_start_time: u64,
    ) -> StepOutcome {
        let step_deadline_ms = (step.duration_min * 60_000.0).round() as u64;
        let mut step_elapsed_ms = 0u64;

        loop {
            if self.abort_flag.load(Ordering::SeqCst) {
                return StepOutcome::Aborted;
            }
            if !self.hw.is_connected() {
                return StepOutcome::HardwareLost;
            }

            let step_progress = if step_deadline_ms == 0 { 1.0 } else { step_elapsed_ms as f64 / step_deadline_ms as f64 };
            let overall_progress = if total_steps == 0 {
                1.0
            } else {
                (index as f64 + step_progress) / total_steps as f64
            };
            let remaining_s = ((total_duration_ms.saturating_sub(*total_elapsed_ms)) as f64 / 1000.0).max(0.0);
            let _ = self.events.try_send(Event::LiveMetrics(LiveMetrics {
                step_index: index,
                total_steps,
                elapsed_ms: step_elapsed_ms,
                step_progress,
                overall_progress,
                current_frequency: step.frequency_hz,
                current_amplitude: step.amp_vpp,
                remaining_s,
                step_start_time,
                protocol_start_time,
            }));

            if step_elapsed_ms >= step_deadline_ms {
                break;
            }

            let tick = LIVE_METRICS_TICK_MS.min(step_deadline_ms - step_elapsed_ms);
            self.clock.sleep(Duration::from_millis(tick));
            step_elapsed_ms += tick;
            *total_elapsed_ms += tick;
        }
        StepOutcome::Completed
    }

    fn finish_aborted(&mut self, reason: AbortReason, steps_completed: usize, total_elapsed_ms: u64) -> Result<ProtocolSummary, CoreError> {
        let _ = steps_completed;
        let _ = total_elapsed_ms;
        self.set_state(RunnerState::Idle);
        let _ = self.events.send(Event::Aborted(reason.clone()));
        Err(CoreError::Aborted(reason))
    }

    fn finish_hardware_error(
        &mut self,
        err: crate::error::HardwareError,
        step_index: Option<usize>,
        steps_completed: usize,
        total_elapsed_ms: u64,
    ) -> Result<ProtocolSummary, CoreError> {
        let _ = steps_completed;
        let _ = total_elapsed_ms;
        let _ = step_index;
        self.set_state(RunnerState::Error);
        let _ = self.events.send(Event::ErrorOccurred(err.to_string()));
        Err(CoreError::Hardware(err))
    }
}

/// Best-effort: a transport that can't honor `Burst`/`Gated` output logs a
/// warning and falls back to whatever mode it's already in, the same
/// tolerance `ramp.rs::soft_ramp` shows an intermediate write failure.
fn apply_output_mode<H: HardwareIo>(hw: &mut H, step: &Step) {
    match step.mode {
        OutputMode::Continuous => {
            if let Err(e) = hw.enable_external_trigger_gated(false) {
                warn!(step = %step.label, error = %e, "could not disable trigger gating, continuing");
            }
        }
        OutputMode::Burst => {
            let cycles = step.burst_cycles.unwrap_or_else(|| default_burst_cycles(step));
            if let Err(e) = hw.set_burst_by_cycles(cycles) {
                warn!(step = %step.label, error = %e, "burst mode unsupported, falling back to continuous output");
            }
        }
        OutputMode::Gated => {
            if let Err(e) = hw.enable_external_trigger_gated(true) {
                warn!(step = %step.label, error = %e, "gated trigger unsupported, falling back to continuous output");
            }
        }
    }
}

/// Cycles that fill the step's duration at its frequency, for a `Burst` step
/// that didn't pin an explicit `burst_cycles`.
fn default_burst_cycles(step: &Step) -> u32 {
    (step.frequency_hz * step.duration_min * 60.0).round().clamp(1.0, u32::MAX as f64) as u32
}

enum StepOutcome {
    Completed,
    Aborted,
    HardwareLost,
}

/// A thread-safe handle used to request an abort from outside the thread
/// running `ProtocolRunner::start`.
#[derive(Clone)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantctl_traits::clock::test_clock::TestClock;
    use quantctl_traits::hardware::Waveform;

    use crate::builder::{ProtocolBuilder, StepBuilder};
    use crate::event::event_channel;
    use crate::mocks::FakeHardware;

    fn confirmed(limits: &SafetyLimits) -> HashMap<String, bool> {
        limits.required_confirmations.iter().map(|k| (k.clone(), true)).collect()
    }

    #[test]
    fn runs_a_two_step_protocol_to_completion() {
        let limits = SafetyLimits::default();
        let confirmations = confirmed(&limits);
        let patient = HashMap::new();
        let (tx, rx) = event_channel();
        let clock = TestClock::new();
        let mut runner = ProtocolRunner::new(FakeHardware::default(), clock, limits, tx);

        let step1 = StepBuilder::new()
            .label("s1")
            .frequency_hz(100.0)
            .amp_vpp(1.0)
            .duration_min(0.01)
            .build()
            .unwrap();
        let step2 = StepBuilder::new()
            .label("s2")
            .frequency_hz(200.0)
            .amp_vpp(1.0)
            .duration_min(0.01)
            .build()
            .unwrap();
        let protocol = ProtocolBuilder::new().name("p").step(step1).step(step2).build().unwrap();

        let summary = runner.start(protocol, &patient, &confirmations).unwrap();
        assert_eq!(summary.steps_completed, 2);
        assert_eq!(runner.state(), RunnerState::Finished);

        let mut saw_finished = false;
        while let Ok(ev) = rx.try_recv() {
            if matches!(ev, Event::Finished(_)) {
                saw_finished = true;
            }
        }
        assert!(saw_finished);
    }

    #[test]
    fn rejects_unsafe_first_step() {
        let limits = SafetyLimits::default();
        let confirmations = confirmed(&limits);
        let patient = HashMap::new();
        let (tx, _rx) = event_channel();
        let clock = TestClock::new();
        let mut runner = ProtocolRunner::new(FakeHardware::default(), clock, limits, tx);

        let step = StepBuilder::new()
            .frequency_hz(100.0)
            .amp_vpp(999.0)
            .duration_min(0.01)
            .waveform(Waveform::Square)
            .build()
            .unwrap();
        let protocol = ProtocolBuilder::new().name("p").step(step).build().unwrap();

        let err = runner.start(protocol, &patient, &confirmations).unwrap_err();
        assert!(matches!(err, CoreError::Safety(_)));
        assert_eq!(runner.state(), RunnerState::Error);
    }

    #[test]
    fn abort_mid_protocol_stops_output_and_reports_aborted() {
        let limits = SafetyLimits::default();
        let confirmations = confirmed(&limits);
        let patient = HashMap::new();
        let (tx, rx) = event_channel();
        let clock = TestClock::new();
        let mut runner = ProtocolRunner::new(FakeHardware::default(), clock, limits, tx);
        let handle = runner.abort_handle();
        handle.abort();

        let step = StepBuilder::new().frequency_hz(100.0).amp_vpp(1.0).duration_min(1.0).build().unwrap();
        let protocol = ProtocolBuilder::new().name("p").step(step).build().unwrap();

        let err = runner.start(protocol, &patient, &confirmations).unwrap_err();
        assert!(matches!(err, CoreError::Aborted(AbortReason::User(_))));
        assert_eq!(runner.state(), RunnerState::Idle);

        let mut saw_aborted = false;
        while let Ok(ev) = rx.try_recv() {
            if matches!(ev, Event::Aborted(_)) {
                saw_aborted = true;
            }
        }
        assert!(saw_aborted);
    }

    #[test]
    fn busy_while_already_running() {
        // A fresh runner in Preparing/Running state should reject a second
        // concurrent start; simulate by manually setting state.
        let limits = SafetyLimits::default();
        let (tx, _rx) = event_channel();
        let clock = TestClock::new();
        let mut runner = ProtocolRunner::new(FakeHardware::default(), clock, limits, tx);
        runner.state = RunnerState::Running;

        let step = StepBuilder::new().frequency_hz(100.0).amp_vpp(1.0).duration_min(1.0).build().unwrap();
        let protocol = ProtocolBuilder::new().name("p").step(step).build().unwrap();
        let err = runner.start(protocol, &HashMap::new(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, CoreError::Busy));
    }
}
