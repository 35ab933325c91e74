//! GitHubHost - `RepositoryHost` over the GitHub REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, warn};

use crate::ports::{HostError, RemoteRepository, RepositoryHost};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct CreatedRepository {
    name: String,
    html_url: String,
}

pub struct GitHubHost {
    client: Client,
    api_url: String,
    git_host: String,
    owner: String,
    token: SecretString,
}

impl GitHubHost {
    pub fn new(owner: impl Into<String>, token: SecretString) -> Result<Self, HostError> {
        Self::with_api_url(DEFAULT_API_URL, owner, token)
    }

    /// Point at a different API root (GitHub Enterprise, local stub).
    pub fn with_api_url(
        api_url: impl Into<String>,
        owner: impl Into<String>,
        token: SecretString,
    ) -> Result<Self, HostError> {
        let client = Client::builder()
            .user_agent(concat!("shipwright/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| HostError::Request(e.to_string()))?;
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let git_host = api_url
            .strip_prefix("https://api.")
            .unwrap_or("github.com")
            .to_string();
        Ok(Self {
            client,
            api_url,
            git_host,
            owner: owner.into(),
            token,
        })
    }

    /// Host used in push URLs when it cannot be derived from the API URL.
    pub fn with_git_host(mut self, git_host: impl Into<String>) -> Self {
        self.git_host = git_host.into();
        self
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("token {}", self.token.expose_secret()),
            )
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    fn pages_url(&self, repo_name: &str) -> String {
        format!("https://{}.github.io/{}/", self.owner, repo_name)
    }
}

async fn rejected(response: reqwest::Response) -> HostError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    HostError::Rejected { status, body }
}

#[async_trait]
impl RepositoryHost for GitHubHost {
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
    ) -> Result<RemoteRepository, HostError> {
        let body = serde_json::json!({
            "name": name,
            "description": description,
            "private": false,
        });
        let response = self
            .request(Method::POST, "/user/repos")
            .json(&body)
            .send()
            .await
            .map_err(|e| HostError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let created: CreatedRepository = response
            .json()
            .await
            .map_err(|e| HostError::InvalidResponse(e.to_string()))?;
        info!(repo = %created.name, url = %created.html_url, "repository created");

        Ok(RemoteRepository {
            pages_url: self.pages_url(&created.name),
            name: created.name,
            html_url: created.html_url,
        })
    }

    async fn enable_hosting(&self, repo: &RemoteRepository, branch: &str) -> Result<(), HostError> {
        let path = format!("/repos/{}/{}/pages", self.owner, repo.name);
        let body = serde_json::json!({ "source": { "branch": branch, "path": "/" } });

        let response = self
            .request(Method::POST, &path)
            .json(&body)
            .send()
            .await
            .map_err(|e| HostError::Request(e.to_string()))?;
        if matches!(response.status(), StatusCode::CREATED | StatusCode::ACCEPTED) {
            return Ok(());
        }

        // some accounts only accept the older PUT form of the same endpoint
        warn!(
            repo = %repo.name,
            status = response.status().as_u16(),
            "pages POST rejected, retrying with PUT"
        );
        let response = self
            .request(Method::PUT, &path)
            .json(&body)
            .send()
            .await
            .map_err(|e| HostError::Request(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejected(response).await)
        }
    }

    fn push_url(&self, repo: &RemoteRepository) -> SecretString {
        SecretString::from(format!(
            "https://{}@{}/{}/{}.git",
            self.token.expose_secret(),
            self.git_host,
            self.owner,
            repo.name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> GitHubHost {
        GitHubHost::new("octo", SecretString::from("tkn")).unwrap()
    }

    #[test]
    fn push_url_embeds_token_owner_and_repo() {
        let repo = RemoteRepository {
            name: "captcha-abc123".into(),
            html_url: "https://github.com/octo/captcha-abc123".into(),
            pages_url: "https://octo.github.io/captcha-abc123/".into(),
        };

        assert_eq!(
            host().push_url(&repo).expose_secret(),
            "https://tkn@github.com/octo/captcha-abc123.git"
        );
    }

    #[test]
    fn git_host_can_be_overridden() {
        let host = GitHubHost::with_api_url(
            "https://ghe.example.com/api/v3",
            "octo",
            SecretString::from("tkn"),
        )
        .unwrap()
        .with_git_host("ghe.example.com");
        let repo = RemoteRepository {
            name: "r".into(),
            html_url: String::new(),
            pages_url: String::new(),
        };

        assert_eq!(
            host.push_url(&repo).expose_secret(),
            "https://tkn@ghe.example.com/octo/r.git"
        );
    }

    #[test]
    fn pages_url_is_derived_from_owner() {
        assert_eq!(host().pages_url("r"), "https://octo.github.io/r/");
    }

    #[tokio::test]
    async fn unreachable_api_is_a_request_error() {
        let host = GitHubHost::with_api_url("http://127.0.0.1:9", "octo", SecretString::from("t"))
            .unwrap();

        let err = host.create_repository("r", "d").await.unwrap_err();
        assert!(matches!(err, HostError::Request(_)));
    }
}
