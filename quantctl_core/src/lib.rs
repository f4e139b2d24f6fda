#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Therapy/assessment core: a safety kernel, a multi-step protocol runner,
//! and a frequency-sweep assessment worker, all driven through the
//! `quantctl_traits::HardwareIo` boundary so the generator/oscilloscope
//! transport is never named here.

pub mod builder;
pub mod constants;
pub mod conversions;
pub mod error;
pub mod event;
pub mod hw_error;
pub mod metrics;
pub mod mocks;
pub mod ramp;
pub mod runner;
pub mod safety;
pub mod scoring;
pub mod status;
pub mod types;
mod wallclock;
pub mod worker;

pub use builder::{AssessmentConfigBuilder, BuildError, ProtocolBuilder, StepBuilder};
pub use error::{AbortReason, CoreError, HardwareError};
pub use event::{event_channel, Event, EventReceiver, EventSender, Finished, Started};
pub use metrics::Measurement;
pub use runner::{AbortHandle, ProtocolRunner};
pub use safety::{PatientValue, SafetyFault, SafetyLimits};
pub use scoring::{DefaultScoreStrategy, ScoreStrategy};
pub use status::{RunnerState, SessionState, WorkerState};
pub use types::{AssessmentConfig, AssessmentSummary, Baseline, FrequencyResult, LiveMetrics, Protocol, ProtocolSummary, Step};
pub use worker::{AssessmentWorker, WorkerAbortHandle};
