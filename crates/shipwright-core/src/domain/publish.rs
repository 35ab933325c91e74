//! What a successful publish produces and what the callback receives.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::task::TaskDescriptor;

/// Content hash of a commit, as printed by the version control tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Produced once per run, after the push; consumed only by the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub repo_url: String,
    pub commit_sha: CommitId,
    pub pages_url: String,
}

/// JSON body POSTed to the callback URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: CommitId,
    pub pages_url: String,
}

impl NotificationPayload {
    pub fn new(task: &TaskDescriptor, result: &PublishResult) -> Self {
        Self {
            email: task.email.clone(),
            task: task.task_id.clone(),
            round: task.round,
            nonce: task.nonce.clone(),
            repo_url: result.repo_url.clone(),
            commit_sha: result.commit_sha.clone(),
            pages_url: result.pages_url.clone(),
        }
    }
}
