//! Run report: the terminal, logged record of one pipeline run.

use serde::{Deserialize, Serialize};

use super::ids::RunId;
use super::outcome::{Stage, StageRecord, StageStatus};
use super::publish::PublishResult;
use super::state::RunState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub task: String,
    pub round: u32,
    pub state: RunState,
    pub stages: Vec<StageRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PublishResult>,

    /// Whether the callback acknowledged the notification.
    pub delivered: bool,
}

impl RunReport {
    pub fn new(run_id: RunId, task: impl Into<String>, round: u32) -> Self {
        Self {
            run_id,
            task: task.into(),
            round,
            state: RunState::Running,
            stages: Vec::new(),
            result: None,
            delivered: false,
        }
    }

    pub fn record(&mut self, record: StageRecord) {
        self.stages.push(record);
    }

    /// The stage that aborted the run, if any.
    pub fn failed_stage(&self) -> Option<Stage> {
        self.stages
            .iter()
            .find(|r| r.status == StageStatus::Failed)
            .map(|r| r.stage)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &StageRecord> {
        self.stages.iter().filter(|r| r.status == StageStatus::Warned)
    }

    pub fn ran(&self, stage: Stage) -> bool {
        self.stages.iter().any(|r| r.stage == stage)
    }
}
