//! Error types for gh-actions-client

use lcov_report_core::ReportError;
use thiserror::Error;

/// Errors raised while talking to GitHub services
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success response from an API
    #[error("GitHub API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Required runner environment variable is unset or empty
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    /// Environment variable holds an unusable value
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: String, value: String },

    /// Runtime token is not a usable JWT
    #[error("Invalid runtime token: {0}")]
    InvalidToken(String),

    /// Event payload could not be interpreted
    #[error("Invalid event payload: {0}")]
    InvalidEvent(String),

    /// Artifact service refused an operation
    #[error("Artifact service rejected {0}")]
    Rejected(String),

    /// Archive creation failed
    #[error("Zip error: {0}")]
    Zip(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Http(err.to_string())
    }
}

impl From<zip::result::ZipError> for GitHubError {
    fn from(err: zip::result::ZipError) -> Self {
        GitHubError::Zip(err.to_string())
    }
}

impl GitHubError {
    /// Convert into the pipeline's platform error.
    pub fn into_platform(self) -> ReportError {
        ReportError::Platform(self.to_string())
    }

    /// Convert into the pipeline's artifact error.
    pub fn into_artifact(self) -> ReportError {
        ReportError::Artifact(self.to_string())
    }
}

impl From<GitHubError> for ReportError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Io(io) => ReportError::Io(io),
            config @ (GitHubError::MissingEnv(_)
            | GitHubError::InvalidEnv { .. }
            | GitHubError::InvalidEvent(_)) => ReportError::Config(config.to_string()),
            other => ReportError::Platform(other.to_string()),
        }
    }
}
