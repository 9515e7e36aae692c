//! GitHub REST client for pull request files and issue comments.

use crate::error::GitHubError;
use async_trait::async_trait;
use lcov_report_core::{RepoRef, ReviewPlatform};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size requested when listing pull request files.
pub const PER_PAGE: usize = 100;

const USER_AGENT: &str = concat!("lcov-report/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";

/// Maximum length for error body content in error messages
const MAX_ERROR_BODY_LEN: usize = 200;

#[derive(Deserialize)]
struct PullRequestFile {
    filename: String,
}

#[derive(Serialize)]
struct CreateCommentRequest<'a> {
    body: &'a str,
}

/// Authenticated client for one GitHub API endpoint.
pub struct GitHubClient {
    api_url: String,
    token: String,
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_url, path))
            .header("Accept", ACCEPT)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Every file of a pull request, following pages until a short one.
    pub async fn pull_request_files(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<String>, GitHubError> {
        let path = format!("/repos/{}/{}/pulls/{}/files", repo.owner, repo.repo, number);
        let mut files = Vec::new();
        let mut page = 1usize;

        loop {
            let resp = self
                .request(reqwest::Method::GET, &path)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await?;
            let resp = check_status(resp).await?;
            let batch: Vec<PullRequestFile> = resp.json().await?;

            debug!(page, count = batch.len(), "Fetched pull request files");
            let short = batch.len() < PER_PAGE;
            files.extend(batch.into_iter().map(|f| f.filename));
            if short {
                break;
            }
            page += 1;
        }

        Ok(files)
    }

    /// Create an issue comment on the pull request.
    pub async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<(), GitHubError> {
        let path = format!(
            "/repos/{}/{}/issues/{}/comments",
            repo.owner, repo.repo, number
        );
        let resp = self
            .request(reqwest::Method::POST, &path)
            .json(&CreateCommentRequest { body })
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl ReviewPlatform for GitHubClient {
    async fn list_changed_files(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> lcov_report_core::Result<Vec<String>> {
        self.pull_request_files(repo, number)
            .await
            .map_err(GitHubError::into_platform)
    }

    async fn create_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> lcov_report_core::Result<()> {
        self.create_issue_comment(repo, number, body)
            .await
            .map_err(GitHubError::into_platform)
    }
}

/// Pass a success response through; turn anything else into `GitHubError::Api`.
pub(crate) async fn check_status(
    resp: reqwest::Response,
) -> Result<reqwest::Response, GitHubError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GitHubError::Api {
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_LEN) {
        Some((cut, _)) => format!("{}... (truncated)", &body[..cut]),
        None => body.to_string(),
    }
}
