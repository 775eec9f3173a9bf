//! GitHub client: resolves a login to its numeric id, then lists that
//! account's repositories.
//!
//! No retries and no caching. Each lookup is a two-stage pipeline where a
//! non-success status at either stage ends the lookup as `NotFound`, and stage
//! two is never attempted if stage one fails. A stage-one record without a
//! numeric `id` also ends the lookup as not found.

use anyhow::Context;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub returned {status} while {stage}")]
    NotFound {
        stage: &'static str,
        status: StatusCode,
    },

    #[error("GitHub user record for '{0}' has no numeric id")]
    MissingId(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid GitHub API URL: {0}")]
    Url(String),
}

impl From<GithubError> for AppError {
    fn from(e: GithubError) -> Self {
        match e {
            GithubError::NotFound { .. } | GithubError::MissingId(_) => AppError::GithubNotFound,
            other => AppError::Github(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(base_url: &str, user_agent: &str, token: Option<String>) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("GITHUB_API_URL '{base_url}' is not a valid URL"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("GITHUB_API_URL '{base_url}' cannot be used as a base URL");
        }
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build GitHub HTTP client")?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Returns the repository list for `username`, passed through unmodified.
    pub async fn list_repos(&self, username: &str) -> Result<Value, GithubError> {
        let user: Value = self
            .get_json(&["users", username], "resolving user")
            .await?;
        let id = user
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| GithubError::MissingId(username.to_string()))?;
        debug!("GitHub login '{username}' resolved to id {id}");

        let id = id.to_string();
        self.get_json(&["user", id.as_str(), "repos"], "listing repos")
            .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        stage: &'static str,
    ) -> Result<T, GithubError> {
        let url = self.endpoint(segments)?;
        debug!("GitHub GET {url}");

        let mut request = self.client.get(url).header("accept", GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("GitHub returned {status} while {stage}");
            return Err(GithubError::NotFound { stage, status });
        }

        Ok(response.json::<T>().await?)
    }

    /// Appends percent-encoded path segments to the base URL, keeping any
    /// prefix path (GitHub Enterprise serves the API under `/api/v3`).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GithubError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GithubError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
