//! Task pipeline - runs every stage of one submission, in order.
//!
//! Workspace -> Build -> Publish -> Provision -> Push -> Hosting -> Poll -> Notify
//!
//! A fatal outcome stops the run (state `Aborted`, no notification). Warnings
//! are recorded and the run moves on. Side effects already made on the remote
//! host are never reversed; the report says which ones happened.

use std::sync::Arc;

use chrono::Datelike;
use tracing::{Instrument, error, info, info_span, warn};

use crate::app::notifier::CompletionNotifier;
use crate::app::poller::AvailabilityPoller;
use crate::app::publisher::Publisher;
use crate::app::workspace::{Workspace, WorkspaceManager};
use crate::config::PipelineConfig;
use crate::domain::{
    NotificationPayload, PipelineError, PublishResult, RunId, RunReport, RunState, Stage,
    StageOutcome, StageRecord, TaskDescriptor,
};
use crate::ports::{
    ArtifactBuilder, Clock, HttpTransport, IdGenerator, RemoteRepository, RepositoryHost,
    VersionControl,
};

/// Everything the pipeline talks to outside the process.
#[derive(Clone)]
pub struct PipelinePorts {
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub vcs: Arc<dyn VersionControl>,
    pub host: Arc<dyn RepositoryHost>,
    pub transport: Arc<dyn HttpTransport>,
    pub builder: Arc<dyn ArtifactBuilder>,
}

pub struct TaskPipeline {
    workspaces: WorkspaceManager,
    builder: Arc<dyn ArtifactBuilder>,
    publisher: Publisher,
    host: Arc<dyn RepositoryHost>,
    poller: AvailabilityPoller,
    notifier: CompletionNotifier,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    branch: String,
}

impl TaskPipeline {
    pub fn new(config: &PipelineConfig, ports: PipelinePorts) -> Self {
        Self {
            workspaces: WorkspaceManager::new(
                config.workspace_root.clone(),
                config.retain_workspaces,
                Arc::clone(&ports.ids),
            ),
            builder: ports.builder,
            publisher: Publisher::new(ports.vcs, config.owner.clone()),
            host: ports.host,
            poller: AvailabilityPoller::new(
                Arc::clone(&ports.transport),
                Arc::clone(&ports.clock),
                config.poll.clone(),
            ),
            notifier: CompletionNotifier::new(
                ports.transport,
                Arc::clone(&ports.clock),
                config.notify.clone(),
            ),
            ids: ports.ids,
            clock: ports.clock,
            branch: config.branch.clone(),
        }
    }

    /// Run every stage for `task`. Never fails: the outcome is in the report.
    pub async fn run(&self, run_id: RunId, task: &TaskDescriptor) -> RunReport {
        let span = info_span!("run", run_id = %run_id, task = %task.task_id, round = task.round);
        async move {
            let mut report = RunReport::new(run_id, task.task_id.clone(), task.round);
            info!(attachments = task.attachments.len(), "run started");

            match self.execute(task, &mut report).await {
                Ok(()) => {
                    report.state = RunState::Completed;
                    info!(
                        delivered = report.delivered,
                        warnings = report.warnings().count(),
                        "run completed"
                    );
                }
                Err(e) => {
                    report.state = RunState::Aborted;
                    error!(stage = ?report.failed_stage(), "run aborted: {e}");
                }
            }
            report
        }
        .instrument(span)
        .await
    }

    /// Returns the first fatal error; warnings only land in the report.
    async fn execute(&self, task: &TaskDescriptor, report: &mut RunReport) -> Result<(), PipelineError> {
        let workspace = record(report, Stage::Workspace, self.workspaces.materialize(task).await)?;

        record(report, Stage::Build, self.write_artifacts(&workspace, task).await)?;

        let commit = record(
            report,
            Stage::Publish,
            self.publisher.commit(&workspace, task).await,
        )?;

        let repo = record(report, Stage::Provision, self.create_repository(task).await)?;

        let remote = self.host.push_url(&repo);
        record(
            report,
            Stage::Push,
            self.publisher.push(&workspace, &remote, &self.branch).await,
        )?;
        // nothing reads the directory after the push
        drop(workspace);

        let hosting = self
            .host
            .enable_hosting(&repo, &self.branch)
            .await
            .map_err(|e| PipelineError::ProvisionWarning(e.to_string()));
        let _ = record(report, Stage::Hosting, hosting);

        let _ = record(report, Stage::Poll, self.poll(&repo).await);

        let result = PublishResult {
            repo_url: repo.html_url,
            commit_sha: commit,
            pages_url: repo.pages_url,
        };
        let payload = NotificationPayload::new(task, &result);
        report.result = Some(result);

        let delivery = self.notifier.notify(&task.callback_url, &payload).await;
        let delivered = record(report, Stage::Notify, delivery).is_ok();
        report.delivered = delivered;
        Ok(())
    }

    async fn write_artifacts(&self, workspace: &Workspace, task: &TaskDescriptor) -> StageOutcome<()> {
        let year = self.clock.now().year();
        let files = self.builder.build(&task.brief, &task.attachments, year);
        if let Some(clash) = task.attachments.iter().find(|a| files.contains_key(&a.name)) {
            return Err(PipelineError::Decode {
                name: clash.name.clone(),
                reason: "name is reserved for a generated file".to_string(),
            });
        }
        for (path, content) in &files {
            workspace.write_text(path, content).await?;
        }
        Ok(())
    }

    async fn create_repository(&self, task: &TaskDescriptor) -> StageOutcome<RemoteRepository> {
        let name = format!("{}-{}", task.slug(), self.ids.generate_repo_suffix());
        let description = format!("Task {} round {}", task.task_id, task.round);
        let repo = self
            .host
            .create_repository(&name, &description)
            .await
            .map_err(|e| PipelineError::Provision(e.to_string()))?;
        info!(repo = %repo.html_url, "repository created");
        Ok(repo)
    }

    async fn poll(&self, repo: &RemoteRepository) -> StageOutcome<()> {
        if self.poller.wait_until_available(&repo.pages_url).await {
            return Ok(());
        }
        Err(PipelineError::AvailabilityTimeout {
            url: repo.pages_url.clone(),
            waited: self.poller.timeout(),
        })
    }
}

/// Append the stage's record to the report and hand the outcome back.
fn record<T>(report: &mut RunReport, stage: Stage, outcome: StageOutcome<T>) -> StageOutcome<T> {
    match &outcome {
        Ok(_) => {
            info!(stage = %stage, "stage completed");
            report.record(StageRecord::completed(stage));
        }
        Err(e) if e.is_fatal() => {
            error!(stage = %stage, "stage failed: {e}");
            report.record(StageRecord::failed(stage, e.to_string()));
        }
        Err(e) => {
            warn!(stage = %stage, "stage warning: {e}");
            report.record(StageRecord::warned(stage, e.to_string()));
        }
    }
    outcome
}
