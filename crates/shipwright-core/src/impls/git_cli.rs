//! GitCli - `VersionControl` over the `git` executable.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::process::Command;
use tracing::debug;

use crate::domain::CommitId;
use crate::ports::{VcsError, VersionControl};

pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run one git command in `dir` and return trimmed stdout.
    ///
    /// `shown` is what appears in logs and errors; it differs from `args` only
    /// when an argument is secret.
    async fn run(&self, dir: &Path, args: &[&str], shown: &str) -> Result<String, VcsError> {
        let command = format!("git {shown}");
        debug!(cwd = %dir.display(), "{command}");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| VcsError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VcsError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn init(&self, dir: &Path) -> Result<(), VcsError> {
        self.run(dir, &["init"], "init").await.map(drop)
    }

    async fn configure_identity(
        &self,
        dir: &Path,
        email: &str,
        name: &str,
    ) -> Result<(), VcsError> {
        self.run(dir, &["config", "user.email", email], "config user.email")
            .await?;
        self.run(dir, &["config", "user.name", name], "config user.name")
            .await?;
        Ok(())
    }

    async fn stage_all(&self, dir: &Path) -> Result<(), VcsError> {
        self.run(dir, &["add", "--all"], "add --all").await.map(drop)
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<CommitId, VcsError> {
        self.run(dir, &["commit", "-m", message], "commit").await?;
        let sha = self.run(dir, &["rev-parse", "HEAD"], "rev-parse HEAD").await?;
        if sha.is_empty() || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(VcsError::Output {
                command: "git rev-parse HEAD".to_string(),
                output: sha,
            });
        }
        Ok(CommitId::new(sha))
    }

    async fn add_remote(
        &self,
        dir: &Path,
        name: &str,
        url: &SecretString,
    ) -> Result<(), VcsError> {
        self.run(
            dir,
            &["remote", "add", name, url.expose_secret()],
            &format!("remote add {name} <redacted>"),
        )
        .await
        .map(drop)
    }

    async fn push(&self, dir: &Path, remote: &str, branch: &str) -> Result<(), VcsError> {
        self.run(dir, &["branch", "-M", branch], &format!("branch -M {branch}"))
            .await?;
        self.run(
            dir,
            &["push", "-u", remote, branch],
            &format!("push -u {remote} {branch}"),
        )
        .await
        .map(drop)
    }
}
