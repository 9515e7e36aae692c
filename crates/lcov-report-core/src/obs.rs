//! Structured observability hooks for report run lifecycle events.
//!
//! This module provides:
//! - A run-scoped tracing span
//! - Emission functions for stage execution, gate evaluation, comment and
//!   artifact publication
//!
//! Events are emitted at `info!` level (filterable via `RUST_LOG`).

use tracing::info;

/// Span tagging every event of one workflow run.
///
/// Attach it to the run's future with `tracing::Instrument`:
///
/// ```ignore
/// pipeline.run(&config, &ctx).instrument(run_span(ctx.run_id)).await
/// ```
pub fn run_span(run_id: u64) -> tracing::Span {
    tracing::info_span!("lcov_report.run", run_id = run_id)
}

/// Emit event: an external tool is about to run.
pub fn emit_stage_started(stage: &str, command: &str) {
    info!(event = "stage.started", stage = %stage, command = %command);
}

/// Emit event: an external tool exited.
pub fn emit_stage_finished(stage: &str, exit_code: i32, duration_ms: u64) {
    info!(
        event = "stage.finished",
        stage = %stage,
        exit_code = exit_code,
        duration_ms = duration_ms,
    );
}

/// Emit event: threshold gate evaluated.
pub fn emit_gate_evaluated(total: f64, minimum: i64, passed: bool) {
    info!(
        event = "gate.evaluated",
        total = total,
        minimum = minimum,
        passed = passed,
    );
}

/// Emit event: artifact uploaded.
pub fn emit_artifact_uploaded(name: &str, file_count: usize) {
    info!(event = "artifact.uploaded", name = %name, file_count = file_count);
}

/// Emit event: comment created on the review request.
pub fn emit_comment_posted(repo: &str, number: u64, body_len: usize) {
    info!(
        event = "comment.posted",
        repo = %repo,
        number = number,
        body_len = body_len,
    );
}

/// Emit event: commenting skipped, with the reason.
pub fn emit_comment_skipped(reason: &str) {
    info!(event = "comment.skipped", reason = %reason);
}
