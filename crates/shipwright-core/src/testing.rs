//! Test fixtures and port fakes shared by the unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::app::pipeline::{PipelinePorts, TaskPipeline};
use crate::config::PipelineConfig;
use crate::domain::{Attachment, CommitId, TaskDescriptor};
use crate::impls::StaticSiteBuilder;
use crate::ports::{
    Clock, HostError, HttpTransport, RemoteRepository, RepositoryHost, TransportError,
    UlidGenerator, VcsError, VersionControl, VirtualClock,
};

pub const FAKE_SHA: &str = "3f786850e387550fdab836ed7e6dc881de23001b";

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Task with `n` text attachments named `asset{i}.txt` holding `payload {i}`.
pub fn task_with_attachments(n: usize) -> TaskDescriptor {
    let attachments = (0..n)
        .map(|i| {
            let body = STANDARD.encode(format!("payload {i}"));
            Attachment::new(format!("asset{i}.txt"), format!("data:text/plain;base64,{body}"))
        })
        .collect();

    TaskDescriptor {
        email: "student@example.com".to_string(),
        task_id: "captcha-solver".to_string(),
        round: 1,
        nonce: "nonce-123".to_string(),
        brief: "Build a page that shows an image.".to_string(),
        attachments,
        callback_url: "https://eval.example.com/notify".to_string(),
    }
}

/// Pipeline over fakes that succeeds at every stage, rooted at `root`.
pub fn fake_pipeline(root: &Path, vcs: Arc<FakeVcs>) -> TaskPipeline {
    let clock: Arc<dyn Clock> = Arc::new(VirtualClock::new(epoch()));
    let config = PipelineConfig {
        workspace_root: root.to_path_buf(),
        owner: "me".to_string(),
        ..PipelineConfig::default()
    };
    let ports = PipelinePorts {
        clock: Arc::clone(&clock),
        ids: Arc::new(UlidGenerator::new(clock)),
        vcs,
        host: Arc::new(FakeHost::new()),
        transport: Arc::new(ScriptedTransport::healthy()),
        builder: Arc::new(StaticSiteBuilder::new("me")),
    };
    TaskPipeline::new(&config, ports)
}

fn to_result(scripted: Result<u16, String>) -> Result<u16, TransportError> {
    scripted.map_err(TransportError)
}

/// Replays scripted responses in order. Once a script runs out, probes answer
/// 404 and posts answer 500 (200 for both with `healthy`).
pub struct ScriptedTransport {
    probes: Mutex<VecDeque<Result<u16, String>>>,
    posts: Mutex<VecDeque<Result<u16, String>>>,
    fallback: (u16, u16),
    probed: Mutex<Vec<String>>,
    posted: Mutex<Vec<(String, serde_json::Value)>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self {
            probes: Mutex::default(),
            posts: Mutex::default(),
            fallback: (404, 500),
            probed: Mutex::default(),
            posted: Mutex::default(),
        }
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn healthy() -> Self {
        Self {
            fallback: (200, 200),
            ..Self::default()
        }
    }

    pub fn with_probes(self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.with_probe_results(statuses.into_iter().map(Ok))
    }

    pub fn with_probe_results(self, results: impl IntoIterator<Item = Result<u16, String>>) -> Self {
        self.probes.lock().unwrap().extend(results);
        self
    }

    pub fn with_posts(self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.with_post_results(statuses.into_iter().map(Ok))
    }

    pub fn with_post_results(self, results: impl IntoIterator<Item = Result<u16, String>>) -> Self {
        self.posts.lock().unwrap().extend(results);
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probed.lock().unwrap().len()
    }

    pub fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get_status(&self, url: &str) -> Result<u16, TransportError> {
        self.probed.lock().unwrap().push(url.to_string());
        let next = self.probes.lock().unwrap().pop_front();
        to_result(next.unwrap_or(Ok(self.fallback.0)))
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16, TransportError> {
        self.posted
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        let next = self.posts.lock().unwrap().pop_front();
        to_result(next.unwrap_or(Ok(self.fallback.1)))
    }
}

/// Records every call. `stage_all` snapshots the file names present in the
/// directory so tests can check exactly what would be committed.
#[derive(Default)]
pub struct FakeVcs {
    fail_on: Option<&'static str>,
    calls: Mutex<Vec<String>>,
    dirs: Mutex<Vec<PathBuf>>,
    staged: Mutex<Vec<String>>,
    remotes: Mutex<Vec<String>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the named operation (`"init"`, `"commit"`, `"push"`, ...) fail.
    pub fn failing_on(operation: &'static str) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Every directory a repository was initialized in.
    pub fn init_dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().unwrap().clone()
    }

    pub fn staged(&self) -> Vec<String> {
        self.staged.lock().unwrap().clone()
    }

    pub fn remotes(&self) -> Vec<String> {
        self.remotes.lock().unwrap().clone()
    }

    pub fn committed(&self) -> bool {
        self.calls().iter().any(|c| c.starts_with("commit"))
    }

    fn call(&self, operation: &'static str, detail: String) -> Result<(), VcsError> {
        self.calls.lock().unwrap().push(detail);
        if self.fail_on == Some(operation) {
            return Err(VcsError::Failed {
                command: format!("git {operation}"),
                status: "exit status: 128".to_string(),
                stderr: "fatal: scripted failure".to_string(),
            });
        }
        Ok(())
    }
}

fn snapshot(dir: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path: PathBuf = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap();
                out.push(rel.to_string_lossy().into_owned());
            }
        }
    }
    let mut files = Vec::new();
    walk(dir, dir, &mut files);
    files.sort();
    files
}

#[async_trait]
impl VersionControl for FakeVcs {
    async fn init(&self, dir: &Path) -> Result<(), VcsError> {
        self.dirs.lock().unwrap().push(dir.to_path_buf());
        self.call("init", "init".to_string())
    }

    async fn configure_identity(
        &self,
        _dir: &Path,
        email: &str,
        name: &str,
    ) -> Result<(), VcsError> {
        self.call("configure_identity", format!("identity {name} <{email}>"))
    }

    async fn stage_all(&self, dir: &Path) -> Result<(), VcsError> {
        *self.staged.lock().unwrap() = snapshot(dir);
        self.call("stage_all", "stage_all".to_string())
    }

    async fn commit(&self, _dir: &Path, message: &str) -> Result<CommitId, VcsError> {
        self.call("commit", format!("commit {message}"))?;
        Ok(CommitId::new(FAKE_SHA))
    }

    async fn add_remote(
        &self,
        _dir: &Path,
        name: &str,
        url: &SecretString,
    ) -> Result<(), VcsError> {
        self.remotes
            .lock()
            .unwrap()
            .push(url.expose_secret().to_string());
        self.call("add_remote", format!("add_remote {name}"))
    }

    async fn push(&self, _dir: &Path, remote: &str, branch: &str) -> Result<(), VcsError> {
        self.call("push", format!("push {remote} {branch}"))
    }
}

/// In-memory repository host under the account `me`.
#[derive(Default)]
pub struct FakeHost {
    fail_create: bool,
    fail_hosting: bool,
    created: Mutex<Vec<(String, String)>>,
    hosted: Mutex<Vec<(String, String)>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn failing_hosting() -> Self {
        Self {
            fail_hosting: true,
            ..Self::default()
        }
    }

    /// `(name, description)` of every created repository.
    pub fn created(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap().clone()
    }

    /// `(repository, branch)` of every hosting request.
    pub fn hosted(&self) -> Vec<(String, String)> {
        self.hosted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryHost for FakeHost {
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
    ) -> Result<RemoteRepository, HostError> {
        if self.fail_create {
            return Err(HostError::Rejected {
                status: 422,
                body: "name already exists on this account".to_string(),
            });
        }
        self.created
            .lock()
            .unwrap()
            .push((name.to_string(), description.to_string()));
        Ok(RemoteRepository {
            name: name.to_string(),
            html_url: format!("https://github.com/me/{name}"),
            pages_url: format!("https://me.github.io/{name}/"),
        })
    }

    async fn enable_hosting(&self, repo: &RemoteRepository, branch: &str) -> Result<(), HostError> {
        self.hosted
            .lock()
            .unwrap()
            .push((repo.name.clone(), branch.to_string()));
        if self.fail_hosting {
            return Err(HostError::Rejected {
                status: 409,
                body: "pages unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn push_url(&self, repo: &RemoteRepository) -> SecretString {
        SecretString::from(format!("https://fake-token@github.com/me/{}.git", repo.name))
    }
}
