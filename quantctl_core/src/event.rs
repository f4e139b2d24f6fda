//! Event delivery. Both state machines are handed a `crossbeam_channel::Sender<Event>`
//! at construction and push to it directly, the same way `doser_core::Sampler`
//! is handed a raw channel sender rather than a boxed observer trait; there is
//! exactly one consumer-facing channel type in this crate.

use crate::error::AbortReason;
use crate::status::SessionState;
use crate::types::{AssessmentSummary, Baseline, FrequencyResult, LiveMetrics, Protocol, ProtocolSummary, Step};

pub type EventSender = crossbeam_channel::Sender<Event>;
pub type EventReceiver = crossbeam_channel::Receiver<Event>;

/// Build a bounded, latest-value-wins channel pair sized for `LiveMetrics`
/// coalescing: a full channel means the consumer is behind, so the producer
/// drops the newest-but-one sample via `try_send` rather than blocking or
/// reordering. Other event kinds are sent through the same channel and are
/// never dropped by the producer; a persistently-full channel simply means
/// the consumer has fallen far behind across the board.
pub fn event_channel() -> (EventSender, EventReceiver) {
    crossbeam_channel::bounded(1)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Started {
    Protocol(Protocol),
    Assessment(crate::types::AssessmentConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Finished {
    Protocol(ProtocolSummary),
    Assessment(AssessmentSummary),
}

/// Everything a running session can report back to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Started(Started),
    StepStarted { index: usize, step: Step },
    LiveMetrics(LiveMetrics),
    StepFinished { index: usize },
    BaselineMeasured(Baseline),
    ResultReady(FrequencyResult),
    Finished(Finished),
    Aborted(AbortReason),
    ErrorOccurred(String),
    StateChanged(SessionState),
}
