//! Status board - what each accepted run is doing, for the status route and
//! for logging aggregate counts.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::domain::{PublishResult, RunId, RunReport, RunState, StageRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub run_id: RunId,
    pub task: String,
    pub round: u32,
    pub state: RunState,
    pub stages: Vec<StageRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PublishResult>,

    pub delivered: bool,
}

impl From<RunReport> for RunStatus {
    fn from(report: RunReport) -> Self {
        Self {
            run_id: report.run_id,
            task: report.task,
            round: report.round,
            state: report.state,
            stages: report.stages,
            result: report.result,
            delivered: report.delivered,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub aborted: usize,
}

#[derive(Debug, Default)]
pub struct StatusBoard {
    runs: RwLock<HashMap<RunId, RunStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RunId, RunStatus>> {
        self.runs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RunId, RunStatus>> {
        self.runs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn queued(&self, run_id: RunId, task: impl Into<String>, round: u32) {
        self.write().insert(
            run_id,
            RunStatus {
                run_id,
                task: task.into(),
                round,
                state: RunState::Queued,
                stages: Vec::new(),
                result: None,
                delivered: false,
            },
        );
    }

    pub fn running(&self, run_id: RunId) {
        if let Some(status) = self.write().get_mut(&run_id) {
            status.state = RunState::Running;
        }
    }

    pub fn finished(&self, report: RunReport) {
        self.write().insert(report.run_id, report.into());
    }

    /// Forget a run that was registered but never made it into the queue.
    pub fn discard(&self, run_id: RunId) {
        self.write().remove(&run_id);
    }

    pub fn get(&self, run_id: RunId) -> Option<RunStatus> {
        self.read().get(&run_id).cloned()
    }

    pub fn counts(&self) -> RunCounts {
        self.read()
            .values()
            .fold(RunCounts::default(), |mut counts, status| {
                match status.state {
                    RunState::Queued => counts.queued += 1,
                    RunState::Running => counts.running += 1,
                    RunState::Completed => counts.completed += 1,
                    RunState::Aborted => counts.aborted += 1,
                }
                counts
            })
    }
}
