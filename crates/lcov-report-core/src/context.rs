//! Workflow run identity, passed explicitly through the pipeline.

use serde::{Deserialize, Serialize};

/// Event name of a review-request run.
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// Repository coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse `owner/repo`.
    pub fn parse(slug: &str) -> Option<Self> {
        let (owner, repo) = slug.trim().split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self::new(owner, repo))
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The review request that triggered the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    pub head_sha: String,
}

impl PullRequestRef {
    /// First seven characters of the head commit.
    pub fn short_sha(&self) -> &str {
        let end = self
            .head_sha
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.head_sha.len());
        &self.head_sha[..end]
    }
}

/// Everything the pipeline needs to know about the surrounding workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub repo: RepoRef,
    pub event_name: String,
    pub pull_request: Option<PullRequestRef>,
    pub workflow: String,
    pub run_number: u64,
    pub run_id: u64,
    /// Action identifier, used to name the scratch directory.
    pub action: String,
}

impl RunContext {
    /// Whether this run was triggered by a review request.
    pub fn is_pull_request(&self) -> bool {
        self.event_name == PULL_REQUEST_EVENT
    }
}
