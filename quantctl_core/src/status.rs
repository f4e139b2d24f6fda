//! Session state enums, kept distinct per state machine (`ProtocolRunner` vs
//! `AssessmentWorker`) but folded into a single `SessionState` for event
//! tagging, mirroring `doser_core::status::DoserStatus`'s role as the single
//! source of truth for "what is the engine doing right now".

/// `ProtocolRunner`'s state machine:
/// `Idle -> Preparing -> Running -> Finished`, with `Aborting` reachable from
/// `Preparing`/`Running` and `Error` reachable from any state on an
/// unrecoverable fault. No `Paused` state: `start` runs on a thread the host
/// moves the runner into, so no caller can ever hold `&mut self` to request
/// one; an abort is the only mid-run control available, via `AbortHandle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Preparing,
    Running,
    Aborting,
    Finished,
    Error,
}

/// `AssessmentWorker`'s state machine:
/// `Idle -> Preparing -> Baseline -> Testing -> Analyzing -> Finished`, with
/// `Aborted` reachable from `Preparing`/`Baseline`/`Testing` and `Error`
/// reachable from any state on an unrecoverable fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Preparing,
    Baseline,
    Testing,
    Analyzing,
    Finished,
    Aborted,
    Error,
}

/// The state of whichever session is active, for event tagging. Each
/// state machine converts its own enum into this one; nothing upstream needs
/// to know which kind of session produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Runner(RunnerState),
    Worker(WorkerState),
}

impl From<RunnerState> for SessionState {
    fn from(s: RunnerState) -> Self {
        SessionState::Runner(s)
    }
}

impl From<WorkerState> for SessionState {
    fn from(s: WorkerState) -> Self {
        SessionState::Worker(s)
    }
}

impl RunnerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunnerState::Finished | RunnerState::Error | RunnerState::Idle)
    }

    pub fn is_active(self) -> bool {
        matches!(self, RunnerState::Preparing | RunnerState::Running | RunnerState::Aborting)
    }
}

impl WorkerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkerState::Finished | WorkerState::Aborted | WorkerState::Error | WorkerState::Idle
        )
    }

    pub fn is_active(self) -> bool {
        matches!(
            self,
            WorkerState::Preparing | WorkerState::Baseline | WorkerState::Testing | WorkerState::Analyzing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_terminal_states() {
        assert!(RunnerState::Finished.is_terminal());
        assert!(RunnerState::Idle.is_terminal());
        assert!(!RunnerState::Running.is_terminal());
    }

    #[test]
    fn worker_active_states() {
        assert!(WorkerState::Baseline.is_active());
        assert!(!WorkerState::Finished.is_active());
    }
}
