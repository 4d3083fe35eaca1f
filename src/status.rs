//! Final status of a run, mapped onto the process exit code.

use std::fmt;

/// How a cutover, bootstrap or status run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every planned operation succeeded (or was reported, in dry run).
    Completed,
    /// No follower to promote, or no index to follow.
    NothingToDo,
    /// One or more items failed; the rest were processed.
    PartialFailure,
    /// Operator declined at the confirmation gate; nothing was changed.
    Aborted,
}

impl RunStatus {
    /// Process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::PartialFailure => 1,
            Self::NothingToDo => 2,
            Self::Aborted => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::NothingToDo => "nothing_to_do",
            Self::PartialFailure => "partial_failure",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
