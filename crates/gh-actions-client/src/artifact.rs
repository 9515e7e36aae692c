//! Actions artifact client
//!
//! Uploads a file tree as a single zipped artifact through the results
//! service used by the Actions runner (artifact protocol v4):
//!
//! 1. `CreateArtifact` returns a signed blob URL
//! 2. the zip archive is PUT to that URL as a block blob
//! 3. `FinalizeArtifact` records its size and SHA-256
//!
//! The run and job backend ids come from the `scp` claim of the runtime token.

use crate::error::GitHubError;
use crate::github::check_status;
use async_trait::async_trait;
use base64::Engine;
use lcov_report_core::ArtifactStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

const SERVICE_PATH: &str = "twirp/github.actions.results.api.v1.ArtifactService";
const ARTIFACT_VERSION: u32 = 4;
const RESULTS_SCOPE: &str = "Actions.Results";

/// Characters the artifact service refuses in names.
const INVALID_NAME_CHARS: &[char] = &['"', ':', '<', '>', '|', '*', '?', '\r', '\n', '\\', '/'];

/// Artifact service configuration
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    /// Results service base URL (`ACTIONS_RESULTS_URL`)
    pub results_url: String,
    /// Runner-issued JWT (`ACTIONS_RUNTIME_TOKEN`)
    pub runtime_token: String,
}

impl ArtifactConfig {
    pub fn new(results_url: &str, runtime_token: &str) -> Self {
        ArtifactConfig {
            results_url: results_url.to_string(),
            runtime_token: runtime_token.to_string(),
        }
    }

    /// Read the configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GitHubError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| GitHubError::MissingEnv(name.to_string()))
        };
        Ok(Self::new(
            &get("ACTIONS_RESULTS_URL")?,
            &get("ACTIONS_RUNTIME_TOKEN")?,
        ))
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, GitHubError> {
        Self::from_lookup(crate::env::process_env)
    }
}

/// Workflow run and job ids as known to the results service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendIds {
    pub workflow_run_backend_id: String,
    pub workflow_job_run_backend_id: String,
}

#[derive(Deserialize)]
struct TokenClaims {
    #[serde(default)]
    scp: String,
}

/// Extract the backend ids from the runtime token's `scp` claim.
///
/// The claim is a space-separated scope list; the relevant entry has the
/// form `Actions.Results:<run backend id>:<job backend id>`.
pub fn backend_ids(runtime_token: &str) -> Result<BackendIds, GitHubError> {
    let payload = runtime_token
        .split('.')
        .nth(1)
        .ok_or_else(|| GitHubError::InvalidToken("not a JWT".to_string()))?;
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| GitHubError::InvalidToken(e.to_string()))?;
    let claims: TokenClaims = serde_json::from_slice(&decoded)
        .map_err(|e| GitHubError::InvalidToken(e.to_string()))?;

    for scope in claims.scp.split(' ') {
        let parts: Vec<&str> = scope.split(':').collect();
        if parts.first() != Some(&RESULTS_SCOPE) {
            continue;
        }
        if parts.len() != 3 {
            return Err(GitHubError::InvalidToken(format!(
                "malformed results scope {scope:?}"
            )));
        }
        return Ok(BackendIds {
            workflow_run_backend_id: parts[1].to_string(),
            workflow_job_run_backend_id: parts[2].to_string(),
        });
    }

    Err(GitHubError::InvalidToken(
        "no Actions.Results scope in token".to_string(),
    ))
}

/// Reject names the artifact service would refuse.
pub fn validate_name(name: &str) -> Result<(), GitHubError> {
    if name.trim().is_empty() {
        return Err(GitHubError::Rejected("empty artifact name".to_string()));
    }
    if let Some(c) = name.chars().find(|c| INVALID_NAME_CHARS.contains(c)) {
        return Err(GitHubError::Rejected(format!(
            "artifact name {name:?}: invalid character {c:?}"
        )));
    }
    Ok(())
}

/// Archive entry name for `file` relative to `root`, `/`-separated.
fn entry_name(file: &Path, root: &Path) -> Result<String, GitHubError> {
    let rel = file.strip_prefix(root).map_err(|_| {
        GitHubError::Rejected(format!("{} is not under {}", file.display(), root.display()))
    })?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            _ => {
                return Err(GitHubError::Rejected(format!(
                    "unsupported path {}",
                    file.display()
                )))
            }
        }
    }
    if parts.is_empty() {
        return Err(GitHubError::Rejected(format!(
            "{} is the upload root",
            file.display()
        )));
    }
    Ok(parts.join("/"))
}

/// Zip `files` into memory, deflated, with entries relative to `root`.
pub fn build_archive(files: &[PathBuf], root: &Path) -> Result<Vec<u8>, GitHubError> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for file in files {
        let name = entry_name(file, root)?;
        let bytes = std::fs::read(file)?;
        writer.start_file(name, options)?;
        writer.write_all(&bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}

#[derive(Serialize)]
struct CreateArtifactRequest<'a> {
    workflow_run_backend_id: &'a str,
    workflow_job_run_backend_id: &'a str,
    name: &'a str,
    version: u32,
}

#[derive(Deserialize)]
struct CreateArtifactResponse {
    ok: bool,
    #[serde(default)]
    signed_upload_url: String,
}

#[derive(Serialize)]
struct FinalizeArtifactRequest<'a> {
    workflow_run_backend_id: &'a str,
    workflow_job_run_backend_id: &'a str,
    name: &'a str,
    size: String,
    hash: String,
}

#[derive(Deserialize)]
struct FinalizeArtifactResponse {
    ok: bool,
    #[serde(default)]
    artifact_id: Option<serde_json::Value>,
}

/// Artifact store backed by the Actions results service
pub struct ActionsArtifactStore {
    config: ArtifactConfig,
    http_client: reqwest::Client,
}

impl ActionsArtifactStore {
    pub fn new(config: ArtifactConfig) -> Result<Self, GitHubError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("lcov-report/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ActionsArtifactStore {
            config,
            http_client,
        })
    }

    pub fn from_env() -> Result<Self, GitHubError> {
        Self::new(ArtifactConfig::from_env()?)
    }

    fn service_url(&self, method: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.results_url.trim_end_matches('/'),
            SERVICE_PATH,
            method
        )
    }

    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, GitHubError>
    where
        Req: Serialize + ?Sized,
        Resp: for<'de> Deserialize<'de>,
    {
        let resp = self
            .http_client
            .post(self.service_url(method))
            .header(
                "Authorization",
                format!("Bearer {}", self.config.runtime_token),
            )
            .json(request)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Upload `files` as one artifact. Returns the archive size in bytes.
    pub async fn upload_tree(
        &self,
        name: &str,
        files: &[PathBuf],
        root: &Path,
    ) -> Result<u64, GitHubError> {
        validate_name(name)?;
        if files.is_empty() {
            return Err(GitHubError::Rejected(format!("artifact {name:?}: no files")));
        }
        let ids = backend_ids(&self.config.runtime_token)?;

        let files = files.to_vec();
        let root = root.to_path_buf();
        let archive = tokio::task::spawn_blocking(move || build_archive(&files, &root))
            .await
            .map_err(|e| GitHubError::Io(std::io::Error::other(e.to_string())))??;
        let size = archive.len() as u64;
        let hash = hex::encode(Sha256::digest(&archive));
        debug!(name, size, "Built artifact archive");

        let created: CreateArtifactResponse = self
            .call(
                "CreateArtifact",
                &CreateArtifactRequest {
                    workflow_run_backend_id: &ids.workflow_run_backend_id,
                    workflow_job_run_backend_id: &ids.workflow_job_run_backend_id,
                    name,
                    version: ARTIFACT_VERSION,
                },
            )
            .await?;
        if !created.ok || created.signed_upload_url.is_empty() {
            return Err(GitHubError::Rejected("CreateArtifact".to_string()));
        }

        let resp = self
            .http_client
            .put(&created.signed_upload_url)
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", "application/zip")
            .body(archive)
            .send()
            .await?;
        check_status(resp).await?;

        let finalized: FinalizeArtifactResponse = self
            .call(
                "FinalizeArtifact",
                &FinalizeArtifactRequest {
                    workflow_run_backend_id: &ids.workflow_run_backend_id,
                    workflow_job_run_backend_id: &ids.workflow_job_run_backend_id,
                    name,
                    size: size.to_string(),
                    hash: format!("sha256:{hash}"),
                },
            )
            .await?;
        if !finalized.ok {
            return Err(GitHubError::Rejected("FinalizeArtifact".to_string()));
        }

        info!(
            name,
            size,
            artifact_id = ?finalized.artifact_id,
            "Artifact finalized"
        );
        Ok(size)
    }
}

#[async_trait]
impl ArtifactStore for ActionsArtifactStore {
    async fn upload(
        &self,
        name: &str,
        files: &[PathBuf],
        root: &Path,
    ) -> lcov_report_core::Result<()> {
        self.upload_tree(name, files, root)
            .await
            .map(|_| ())
            .map_err(GitHubError::into_artifact)
    }
}
