//! Publisher - turns a built workspace into a commit and pushes it.
//!
//! Every tool failure becomes `PipelineError::Publish`; nothing is retried.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::info;

use crate::app::workspace::Workspace;
use crate::domain::{CommitId, PipelineError, StageOutcome, TaskDescriptor};
use crate::ports::{VcsError, VersionControl};

pub const REMOTE_NAME: &str = "origin";

pub struct Publisher {
    vcs: Arc<dyn VersionControl>,
    author: String,
}

impl Publisher {
    /// `author` is the commit identity name; the email comes from the task.
    pub fn new(vcs: Arc<dyn VersionControl>, author: impl Into<String>) -> Self {
        Self {
            vcs,
            author: author.into(),
        }
    }

    pub async fn commit(
        &self,
        workspace: &Workspace,
        task: &TaskDescriptor,
    ) -> StageOutcome<CommitId> {
        let dir = workspace.path();
        self.vcs.init(dir).await.map_err(publish_error)?;
        self.vcs
            .configure_identity(dir, &task.email, &self.author)
            .await
            .map_err(publish_error)?;
        self.vcs.stage_all(dir).await.map_err(publish_error)?;

        let message = commit_message(task);
        let commit = self.vcs.commit(dir, &message).await.map_err(publish_error)?;
        info!(task = %task.task_id, commit = %commit, "local commit created");
        Ok(commit)
    }

    pub async fn push(
        &self,
        workspace: &Workspace,
        remote_url: &SecretString,
        branch: &str,
    ) -> StageOutcome<()> {
        let dir = workspace.path();
        self.vcs
            .add_remote(dir, REMOTE_NAME, remote_url)
            .await
            .map_err(publish_error)?;
        self.vcs
            .push(dir, REMOTE_NAME, branch)
            .await
            .map_err(publish_error)
    }
}

pub fn commit_message(task: &TaskDescriptor) -> String {
    format!("Initial commit for {} round {}", task.task_id, task.round)
}

fn publish_error(e: VcsError) -> PipelineError {
    PipelineError::Publish(e.to_string())
}
