//! Impls - production implementations of the ports.
//!
//! - **GitCli**: `VersionControl` via the `git` executable
//! - **GitHubHost**: `RepositoryHost` via the GitHub REST API
//! - **ReqwestTransport**: `HttpTransport` for probes and callbacks
//! - **StaticSiteBuilder**: `ArtifactBuilder` producing a one-page site
//! - **InMemorySecretStore / FileSecretStore**: `SecretStore`

pub mod git_cli;
pub mod github;
pub mod reqwest_transport;
pub mod secret_stores;
pub mod static_site;

pub use self::git_cli::GitCli;
pub use self::github::GitHubHost;
pub use self::reqwest_transport::ReqwestTransport;
pub use self::secret_stores::{FileSecretStore, InMemorySecretStore};
pub use self::static_site::StaticSiteBuilder;
