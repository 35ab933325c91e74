//! VersionControl port - the capabilities the publisher needs from git.
//!
//! # Implementations
//! - `GitCli`: shells out to the `git` executable
//! - tests use a recording fake

use std::path::Path;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use crate::domain::CommitId;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from `{command}`: {output}")]
    Output { command: String, output: String },
}

/// Every method runs inside `dir`, a workspace owned by a single run.
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn init(&self, dir: &Path) -> Result<(), VcsError>;

    async fn configure_identity(&self, dir: &Path, email: &str, name: &str)
    -> Result<(), VcsError>;

    async fn stage_all(&self, dir: &Path) -> Result<(), VcsError>;

    /// Create a commit and return its content hash.
    async fn commit(&self, dir: &Path, message: &str) -> Result<CommitId, VcsError>;

    /// `url` may embed credentials and must never be logged.
    async fn add_remote(&self, dir: &Path, name: &str, url: &SecretString)
    -> Result<(), VcsError>;

    async fn push(&self, dir: &Path, remote: &str, branch: &str) -> Result<(), VcsError>;
}
