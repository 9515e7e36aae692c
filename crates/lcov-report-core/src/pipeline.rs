//! Report pipeline orchestration.

use crate::artifact::publish_report;
use crate::changed::changed_files_detail;
use crate::comment::{post_comment, render_comment, should_comment, SkipReason};
use crate::config::ReportConfig;
use crate::context::RunContext;
use crate::error::{ReportError, Result};
use crate::gate::{CoverageGate, GateVerdict};
use crate::locate::locate_trace_files;
use crate::merge::merge_traces;
use crate::obs;
use crate::platform::{ArtifactStore, ReviewPlatform};
use crate::render::render_html;
use crate::runner::ProcessRunner;
use crate::stage::LcovStage;
use crate::summary::summarize;
use crate::total::total_coverage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Instrument};

/// What happened to the pull request comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    /// A new comment was created on this pull request.
    Posted { number: u64 },
    /// Commenting did not apply to this run.
    Skipped(SkipReason),
}

/// Result of a complete report run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Trace files that were merged, in order.
    pub tracefiles: Vec<PathBuf>,

    /// Number of files uploaded in the HTML artifact.
    pub artifact_files: usize,

    /// Gate decision on the merged total.
    pub verdict: GateVerdict,

    pub comment: CommentOutcome,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Whether the run should end successfully.
    pub fn success(&self) -> bool {
        self.verdict.passed
    }
}

/// Coverage report orchestrator.
///
/// Steps run strictly in sequence and the first tool, network or I/O
/// error aborts the run. A coverage value below the minimum does not: it
/// is computed after reporting and returned in [`PipelineResult::verdict`].
pub struct ReportPipeline {
    runner: Arc<dyn ProcessRunner>,
    platform: Arc<dyn ReviewPlatform>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl ReportPipeline {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        platform: Arc<dyn ReviewPlatform>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            runner,
            platform,
            artifacts,
        }
    }

    /// Run the pipeline inside a fresh scratch directory, removed afterwards.
    pub async fn run(&self, config: &ReportConfig, ctx: &RunContext) -> Result<PipelineResult> {
        let scratch = tempfile::Builder::new()
            .prefix(&scratch_prefix(&ctx.action))
            .tempdir()?;

        self.run_in(config, ctx, scratch.path().to_path_buf())
            .instrument(obs::run_span(ctx.run_id))
            .await
    }

    /// Run the pipeline writing the merged trace and HTML tree under `scratch`.
    pub async fn run_in(
        &self,
        config: &ReportConfig,
        ctx: &RunContext,
        scratch: PathBuf,
    ) -> Result<PipelineResult> {
        let start = Instant::now();
        let runner = self.runner.as_ref();
        let branch = config.branch_coverage;

        info!(repo = %ctx.repo, event = %ctx.event_name, "Starting coverage report");

        if config.install_lcov {
            LcovStage::Install.execute(runner, false).await?;
        }

        let tracefiles = locate_trace_files(&config.coverage_files)?;
        info!(count = tracefiles.len(), pattern = %config.coverage_files, "Located trace files");

        let bundle = render_html(
            runner,
            &tracefiles,
            &config.working_directory,
            &scratch,
            branch,
        )
        .await?;
        publish_report(self.artifacts.as_ref(), &config.artifact_name, &bundle).await?;

        let merged = merge_traces(runner, &tracefiles, &scratch, branch).await?;
        let total = total_coverage(&merged).await?;
        let verdict = CoverageGate::evaluate(
            total,
            config.minimum_coverage,
            &config.failure_message(),
        );

        let comment = match should_comment(config.github_token.as_deref(), ctx) {
            Ok(()) => {
                let pr = ctx.pull_request.as_ref().ok_or_else(|| {
                    ReportError::MissingPullRequest(
                        "pull_request event without pull request payload".to_string(),
                    )
                })?;

                let summary = summarize(runner, &merged, branch).await?;
                let detail = changed_files_detail(
                    runner,
                    self.platform.as_ref(),
                    &ctx.repo,
                    pr.number,
                    &merged,
                    branch,
                )
                .await?;

                let body = render_comment(ctx, pr, &summary, &detail, &verdict);
                post_comment(self.platform.as_ref(), ctx, pr, &body).await?;
                CommentOutcome::Posted { number: pr.number }
            }
            Err(reason) => {
                obs::emit_comment_skipped(reason.as_str());
                CommentOutcome::Skipped(reason)
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(total, passed = verdict.passed, duration_ms, "Coverage report finished");

        Ok(PipelineResult {
            tracefiles,
            artifact_files: bundle.files.len(),
            verdict,
            comment,
            duration_ms,
        })
    }
}

/// Scratch directory prefix derived from the action id.
fn scratch_prefix(action: &str) -> String {
    let cleaned: String = action
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "lcov-report".to_string()
    } else {
        format!("{cleaned}-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_prefix() {
        assert_eq!(scratch_prefix("__run_2"), "__run_2-");
        assert_eq!(scratch_prefix("owner/action"), "owner_action-");
        assert_eq!(scratch_prefix(""), "lcov-report");
    }

    #[test]
    fn test_result_success_follows_verdict() {
        let result = PipelineResult {
            tracefiles: vec![PathBuf::from("a.info")],
            artifact_files: 3,
            verdict: CoverageGate::evaluate(79.0, 80, "low"),
            comment: CommentOutcome::Skipped(SkipReason::NoToken),
            duration_ms: 10,
        };
        assert!(!result.success());
    }
}
