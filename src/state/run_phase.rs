use std::fmt;

/// Phase of one crawl run
///
/// `Draining` begins as soon as no further jobs will be enqueued, either
/// because the run was cancelled or because the producer finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    Starting,
    Running,
    Draining,
    Finished,
}

impl RunPhase {
    /// Returns true if the run may move from this phase to `next`
    ///
    /// A run that fails while starting goes to `Finished` directly.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Starting, Running)
                | (Starting, Finished)
                | (Running, Draining)
                | (Running, Finished)
                | (Draining, Finished)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
