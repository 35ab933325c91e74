//! Outcome model: what each stage of a run produced.
//!
//! A stage returns a `StageOutcome<T>`; the orchestrator turns it into a
//! `StageRecord` and decides whether to continue, warn, or abort.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::PipelineError;

/// Tagged result of one stage: `Ok(value)` or `Err(kind-carrying error)`.
pub type StageOutcome<T> = Result<T, PipelineError>;

/// The pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Workspace,
    Build,
    Publish,
    Provision,
    Push,
    Hosting,
    Poll,
    Notify,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Workspace => "workspace",
            Stage::Build => "build",
            Stage::Publish => "publish",
            Stage::Provision => "provision",
            Stage::Push => "push",
            Stage::Hosting => "hosting",
            Stage::Poll => "poll",
            Stage::Notify => "notify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized as COMPLETED / WARNED / FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Completed,
    Warned,
    Failed,
}

/// One line of a run's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StageRecord {
    pub fn completed(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Completed,
            detail: None,
        }
    }

    pub fn warned(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Warned,
            detail: Some(detail.into()),
        }
    }

    pub fn failed(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Failed,
            detail: Some(detail.into()),
        }
    }
}
