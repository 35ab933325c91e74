//! Run state machine.

use serde::{Deserialize, Serialize};

/// Run state.
///
/// State transitions:
/// - Queued -> Running -> Completed (every fatal stage succeeded; warnings allowed)
/// - Queued -> Running -> Aborted (a fatal stage failed)
///
/// There is no retry edge: an aborted run must be resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Accepted, waiting for a free worker.
    Queued,

    /// A worker is executing the stages.
    Running,

    /// All stages ran; the notification may still have failed.
    Completed,

    /// A fatal stage failed; later stages were skipped.
    Aborted,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Aborted)
    }
}
