use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use secrecy::SecretString;
use shipwright_core::app::{AppBuilder, BackoffPolicy};
use shipwright_core::config::{PipelineConfig, PollConfig};
use shipwright_core::impls::github::DEFAULT_API_URL;
use shipwright_core::impls::reqwest_transport::DEFAULT_REQUEST_TIMEOUT;
use shipwright_core::impls::{
    FileSecretStore, GitCli, GitHubHost, ReqwestTransport, StaticSiteBuilder,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, prelude::*};

mod routes;

/// Build, publish and report static sites for submitted tasks.
#[derive(Parser, Debug)]
#[command(name = "shipwright", version, about)]
struct Args {
    /// Interface to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    bind: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Parallel pipeline workers
    #[arg(long, env = "MAX_WORKERS", default_value_t = 4)]
    workers: usize,

    /// Submissions held while every worker is busy; beyond this intake answers 503
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = 64)]
    queue_capacity: usize,

    /// GitHub token used for the API and for pushing
    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    github_token: String,

    /// GitHub account that owns the created repositories
    #[arg(long, env = "GH_USER")]
    github_user: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    github_api_url: String,

    /// Parent directory of the per-task workspaces
    #[arg(long, env = "WORKDIR_BASE", default_value = "workspaces")]
    workdir: PathBuf,

    /// Keep workspaces after each run
    #[arg(long, env = "RETAIN_WORKSPACES")]
    retain_workspaces: bool,

    /// JSON file mapping submitter email to secret
    #[arg(long, env = "SECRETS_FILE", default_value = "student_secrets.json")]
    secrets_file: PathBuf,

    /// Bearer token required by /admin/add_secret; open when unset
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    /// Seconds to wait for the hosted site to answer 200
    #[arg(long, env = "POLL_TIMEOUT_SECS", default_value_t = 180)]
    poll_timeout_secs: u64,

    /// Seconds between availability probes
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 2)]
    poll_interval_secs: u64,

    /// Callback delivery attempts
    #[arg(long, env = "NOTIFY_ATTEMPTS", default_value_t = 8)]
    notify_attempts: u32,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            workspace_root: self.workdir.clone(),
            retain_workspaces: self.retain_workspaces,
            owner: self.github_user.clone(),
            poll: PollConfig {
                timeout: Duration::from_secs(self.poll_timeout_secs),
                interval: Duration::from_secs(self.poll_interval_secs),
            },
            notify: BackoffPolicy {
                max_attempts: self.notify_attempts,
                ..BackoffPolicy::default()
            },
            ..PipelineConfig::default()
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,shipwright={level},shipwright_core={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).context("invalid RUST_LOG")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let config = args.pipeline_config();
    let secrets = FileSecretStore::open(&args.secrets_file)
        .with_context(|| format!("loading {}", args.secrets_file.display()))?;
    let host = GitHubHost::with_api_url(
        args.github_api_url.clone(),
        args.github_user.clone(),
        SecretString::from(args.github_token.clone()),
    )?;
    let transport = ReqwestTransport::new(DEFAULT_REQUEST_TIMEOUT)?;

    let running = AppBuilder::new(config)
        .vcs(Arc::new(GitCli::new()))
        .host(Arc::new(host))
        .transport(Arc::new(transport))
        .artifact_builder(Arc::new(StaticSiteBuilder::new(args.github_user.clone())))
        .secrets(Arc::new(secrets))
        .build()?
        .start();

    let state = routes::AppState::new(running.clone(), args.admin_token.map(SecretString::from));
    let listener = TcpListener::bind((args.bind.as_str(), args.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        workers = args.workers,
        owner = %args.github_user,
        "shipwright listening"
    );

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    running.workers.shutdown_and_join().await;
    Ok(())
}
