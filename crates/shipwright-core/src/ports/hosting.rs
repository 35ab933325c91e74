//! RepositoryHost port - remote repository creation and static hosting.
//!
//! # Implementations
//! - `GitHubHost`: GitHub REST API (repos + pages)

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// A repository that exists on the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub name: String,
    /// Canonical browser URL, reported to the callback.
    pub html_url: String,
    /// Where the hosted artifact will be served once hosting is enabled.
    pub pages_url: String,
}

#[async_trait]
pub trait RepositoryHost: Send + Sync {
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
    ) -> Result<RemoteRepository, HostError>;

    /// Serve `branch` of `repo` as a public static site.
    async fn enable_hosting(&self, repo: &RemoteRepository, branch: &str) -> Result<(), HostError>;

    /// Authenticated push URL for `repo`.
    fn push_url(&self, repo: &RemoteRepository) -> SecretString;
}
