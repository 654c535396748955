/// Worker state definitions
///
/// A worker only decides whether to keep going while `Idle`; cancellation is
/// observed there and moves it to `Stopped`.
use std::fmt;

/// Represents what a single worker is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting for the next job
    Idle,

    /// Fetching a detail page
    Fetching,

    /// The last job produced a new stored record
    Success,

    /// The last job failed, was a duplicate, or was discarded
    Failure,

    /// The worker has exited
    Stopped,
}

impl WorkerState {
    /// Returns true if the worker may move from this state to `next`
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        match (self, next) {
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Idle, Fetching) => true,
            (Fetching, Success) | (Fetching, Failure) => true,
            (Success, Idle) | (Failure, Idle) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
