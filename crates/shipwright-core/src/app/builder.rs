//! AppBuilder - wires the ports into a pipeline, a worker group and intake.
//!
//! Fail-fast: `build()` validates the configuration and reports every port
//! that was never provided, so a misconfigured process stops before it binds
//! a socket.

use std::sync::Arc;

use crate::app::intake::Intake;
use crate::app::pipeline::{PipelinePorts, TaskPipeline};
use crate::app::runtime::{TaskSubmitter, WorkerGroup};
use crate::app::status::StatusBoard;
use crate::config::{ConfigError, PipelineConfig};
use crate::ports::{
    ArtifactBuilder, Clock, HttpTransport, IdGenerator, RepositoryHost, SecretStore, SystemClock,
    UlidGenerator, VersionControl,
};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing ports: {0:?}. These must be provided before build().")]
    MissingPorts(Vec<&'static str>),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// # Example
/// ```ignore
/// let app = AppBuilder::new(config)
///     .vcs(Arc::new(GitCli::new()))
///     .host(Arc::new(host))
///     .transport(Arc::new(ReqwestTransport::new(DEFAULT_REQUEST_TIMEOUT)?))
///     .artifact_builder(Arc::new(StaticSiteBuilder::new(owner)))
///     .secrets(Arc::new(FileSecretStore::open(path)?))
///     .build()?;
/// let running = app.start();
/// ```
pub struct AppBuilder {
    config: PipelineConfig,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    vcs: Option<Arc<dyn VersionControl>>,
    host: Option<Arc<dyn RepositoryHost>>,
    transport: Option<Arc<dyn HttpTransport>>,
    builder: Option<Arc<dyn ArtifactBuilder>>,
    secrets: Option<Arc<dyn SecretStore>>,
}

impl AppBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            clock: None,
            ids: None,
            vcs: None,
            host: None,
            transport: None,
            builder: None,
            secrets: None,
        }
    }

    /// Defaults to `SystemClock`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults to a `UlidGenerator` over the configured clock.
    pub fn ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn vcs(mut self, vcs: Arc<dyn VersionControl>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    pub fn host(mut self, host: Arc<dyn RepositoryHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn artifact_builder(mut self, builder: Arc<dyn ArtifactBuilder>) -> Self {
        self.builder = Some(builder);
        self
    }

    pub fn secrets(mut self, secrets: Arc<dyn SecretStore>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;

        let missing: Vec<&'static str> = [
            ("vcs", self.vcs.is_none()),
            ("host", self.host.is_none()),
            ("transport", self.transport.is_none()),
            ("artifact_builder", self.builder.is_none()),
            ("secrets", self.secrets.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(vcs), Some(host), Some(transport), Some(builder), Some(secrets)) =
            (self.vcs, self.host, self.transport, self.builder, self.secrets)
        else {
            return Err(BuildError::MissingPorts(missing));
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));

        let pipeline = TaskPipeline::new(
            &self.config,
            PipelinePorts {
                clock,
                ids: Arc::clone(&ids),
                vcs,
                host,
                transport,
                builder,
            },
        );

        Ok(App {
            config: self.config,
            pipeline: Arc::new(pipeline),
            ids,
            secrets,
            board: Arc::new(StatusBoard::new()),
        })
    }
}

/// A fully wired application that has not started its workers yet.
pub struct App {
    pub config: PipelineConfig,
    pub pipeline: Arc<TaskPipeline>,
    ids: Arc<dyn IdGenerator>,
    secrets: Arc<dyn SecretStore>,
    board: Arc<StatusBoard>,
}

impl App {
    /// Spawn the workers. Must run inside a tokio runtime.
    pub fn start(self) -> RunningApp {
        let workers = Arc::new(WorkerGroup::spawn(
            self.config.workers,
            self.config.queue_capacity,
            self.pipeline,
            self.ids,
            Arc::clone(&self.board),
        ));
        let submitter: Arc<dyn TaskSubmitter> = workers.clone();
        RunningApp {
            intake: Arc::new(Intake::new(self.secrets, submitter)),
            workers,
            board: self.board,
        }
    }
}

/// Handles shared with the HTTP layer.
#[derive(Clone)]
pub struct RunningApp {
    pub intake: Arc<Intake>,
    pub workers: Arc<WorkerGroup>,
    pub board: Arc<StatusBoard>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunState;
    use crate::impls::{InMemorySecretStore, StaticSiteBuilder};
    use crate::ports::VirtualClock;
    use crate::testing::{FakeHost, FakeVcs, ScriptedTransport, epoch, task_with_attachments};
    use crate::app::intake::IntakeRequest;
    use std::time::Duration;

    fn complete(config: PipelineConfig) -> AppBuilder {
        AppBuilder::new(config)
            .clock(Arc::new(VirtualClock::new(epoch())))
            .vcs(Arc::new(FakeVcs::new()))
            .host(Arc::new(FakeHost::new()))
            .transport(Arc::new(ScriptedTransport::healthy()))
            .artifact_builder(Arc::new(StaticSiteBuilder::new("me")))
            .secrets(Arc::new(
                InMemorySecretStore::new().with_secret("student@example.com", "s3cret"),
            ))
    }

    #[test]
    fn build_reports_every_missing_port() {
        let result = AppBuilder::new(PipelineConfig::default())
            .vcs(Arc::new(FakeVcs::new()))
            .build();

        assert!(matches!(
            result,
            Err(BuildError::MissingPorts(missing))
                if missing == vec!["host", "transport", "artifact_builder", "secrets"]
        ));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = PipelineConfig {
            queue_capacity: 0,
            ..PipelineConfig::default()
        };

        assert!(matches!(
            complete(config).build(),
            Err(BuildError::Config(ConfigError::NoQueueCapacity))
        ));
    }

    #[tokio::test]
    async fn started_app_runs_an_accepted_submission() {
        let root = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            workers: 1,
            workspace_root: root.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        let running = complete(config).build().unwrap().start();

        let task = task_with_attachments(0);
        let run_id = running
            .intake
            .accept(IntakeRequest {
                email: task.email,
                secret: "s3cret".to_string(),
                task: Some(task.task_id),
                round: Some(task.round),
                nonce: Some(task.nonce),
                brief: Some(task.brief),
                evaluation_url: Some(task.callback_url),
                attachments: Vec::new(),
            })
            .unwrap();

        tokio::time::timeout(Duration::from_secs(10), async {
            while !running
                .board
                .get(run_id)
                .is_some_and(|status| status.state.is_terminal())
            {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(running.board.get(run_id).unwrap().state, RunState::Completed);
        running.workers.shutdown_and_join().await;
    }
}
