//! GitHub clients for lcov-report
//!
//! This crate provides the network side of a report run:
//! - `GitHubClient`: pull request file listing and issue comments (REST API)
//! - `ActionsArtifactStore`: artifact upload through the Actions results service
//! - `env`: run context loading from the runner's environment

pub mod artifact;
pub mod env;
pub mod error;
pub mod github;

pub use artifact::{backend_ids, build_archive, ActionsArtifactStore, ArtifactConfig, BackendIds};
pub use env::{api_url, load_run_context, process_env};
pub use error::GitHubError;
pub use github::{GitHubClient, DEFAULT_API_URL, PER_PAGE};

/// Result type for GitHub client operations
pub type Result<T> = std::result::Result<T, GitHubError>;
