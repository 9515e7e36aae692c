//! Capability traits for the services the pipeline talks to.
//!
//! - `ReviewPlatform`: changed-file listing and comment creation on a review request
//! - `ArtifactStore`: build-artifact upload
//!
//! In-memory fakes live in the `fakes` module.

use crate::context::RepoRef;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Code-review platform operations.
#[async_trait]
pub trait ReviewPlatform: Send + Sync {
    /// Repository-relative paths of every file touched by the request,
    /// across all result pages.
    async fn list_changed_files(&self, repo: &RepoRef, number: u64) -> Result<Vec<String>>;

    /// Create a new comment on the request. Never edits existing ones.
    async fn create_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()>;
}

/// Build-artifact storage.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload `files` (absolute paths under `root`) as one artifact named
    /// `name`. Any file that fails aborts the whole upload.
    async fn upload(&self, name: &str, files: &[PathBuf], root: &Path) -> Result<()>;
}
