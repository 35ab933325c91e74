//! Pipeline configuration with production defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::backoff::BackoffPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker pool size must be at least 1")]
    NoWorkers,

    #[error("queue capacity must be at least 1")]
    NoQueueCapacity,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("owner name must not be empty")]
    MissingOwner,

    #[error("default branch must not be empty")]
    MissingBranch,
}

/// Availability poller timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(180),
            interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Parallel workers, fixed for the life of the process.
    pub workers: usize,

    /// Accepted-but-not-started submissions held in memory.
    pub queue_capacity: usize,

    /// Parent directory of every per-task workspace.
    pub workspace_root: PathBuf,

    /// Keep workspaces on disk after the run (debugging).
    pub retain_workspaces: bool,

    /// Commit author name, license holder and hosting account.
    pub owner: String,

    /// Branch pushed and served.
    pub branch: String,

    pub poll: PollConfig,

    pub notify: BackoffPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 64,
            workspace_root: PathBuf::from("workspaces"),
            retain_workspaces: false,
            owner: "student".to_string(),
            branch: "main".to_string(),
            poll: PollConfig::default(),
            notify: BackoffPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::NoQueueCapacity);
        }
        if self.poll.interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.owner.trim().is_empty() {
            return Err(ConfigError::MissingOwner);
        }
        if self.branch.trim().is_empty() {
            return Err(ConfigError::MissingBranch);
        }
        Ok(())
    }
}
