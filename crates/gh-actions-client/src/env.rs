//! Runner environment loading.
//!
//! Reads the `GITHUB_*` variables the Actions runner exports, plus the event
//! payload at `GITHUB_EVENT_PATH`, into a [`RunContext`]. Lookups go through
//! a closure so tests can supply their own environment.

use crate::error::GitHubError;
use crate::github::DEFAULT_API_URL;
use lcov_report_core::{PullRequestRef, RepoRef, RunContext};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: Option<PullRequestPayload>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
    head: HeadPayload,
}

#[derive(Debug, Deserialize)]
struct HeadPayload {
    sha: String,
}

/// Look up a variable in the process environment, treating empty as unset.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required<F>(lookup: &F, name: &str) -> Result<String, GitHubError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GitHubError::MissingEnv(name.to_string()))
}

fn numeric<F>(lookup: &F, name: &str) -> Result<u64, GitHubError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(0),
        Some(value) => value.trim().parse().map_err(|_| GitHubError::InvalidEnv {
            name: name.to_string(),
            value,
        }),
    }
}

/// Build the run context from `lookup`.
///
/// `GITHUB_REPOSITORY` and `GITHUB_EVENT_NAME` are required. The pull request
/// is taken from the event payload when one is present; a payload without a
/// `pull_request` object leaves it unset.
pub fn load_run_context<F>(lookup: F) -> Result<RunContext, GitHubError>
where
    F: Fn(&str) -> Option<String>,
{
    let slug = required(&lookup, "GITHUB_REPOSITORY")?;
    let repo = RepoRef::parse(&slug).ok_or(GitHubError::InvalidEnv {
        name: "GITHUB_REPOSITORY".to_string(),
        value: slug.clone(),
    })?;
    let event_name = required(&lookup, "GITHUB_EVENT_NAME")?;

    let pull_request = match lookup("GITHUB_EVENT_PATH") {
        Some(path) if !path.trim().is_empty() => read_pull_request(Path::new(path.trim()))?,
        _ => None,
    };

    Ok(RunContext {
        repo,
        event_name,
        pull_request,
        workflow: lookup("GITHUB_WORKFLOW").unwrap_or_default(),
        run_number: numeric(&lookup, "GITHUB_RUN_NUMBER")?,
        run_id: numeric(&lookup, "GITHUB_RUN_ID")?,
        action: lookup("GITHUB_ACTION").unwrap_or_default(),
    })
}

/// API endpoint for this run, falling back to the public one.
pub fn api_url<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("GITHUB_API_URL")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Parse the pull request out of an event payload file.
pub fn read_pull_request(path: &Path) -> Result<Option<PullRequestRef>, GitHubError> {
    let raw = std::fs::read_to_string(path)?;
    parse_pull_request(&raw)
}

fn parse_pull_request(raw: &str) -> Result<Option<PullRequestRef>, GitHubError> {
    let payload: EventPayload =
        serde_json::from_str(raw).map_err(|e| GitHubError::InvalidEvent(e.to_string()))?;
    Ok(payload.pull_request.map(|pr| PullRequestRef {
        number: pr.number,
        head_sha: pr.head.sha,
    }))
}
