//! Aggregate coverage summary.

use crate::error::Result;
use crate::merge::MergedTrace;
use crate::runner::ProcessRunner;
use crate::stage::LcovStage;

/// Split captured lcov output into lines, dropping the leading
/// `Reading tracefile ...` banner whatever its exact text.
pub fn strip_banner(output: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = output.trim().lines().collect();
    if !lines.is_empty() {
        lines.remove(0);
    }
    lines
}

/// Run `lcov --summary` on the merged trace and return the report block.
pub async fn summarize(
    runner: &dyn ProcessRunner,
    trace: &MergedTrace,
    branch_coverage: bool,
) -> Result<String> {
    let stage = LcovStage::Summary {
        tracefile: trace.path().to_path_buf(),
    };
    let output = stage.execute(runner, branch_coverage).await?;
    Ok(strip_banner(&output.combined()).join("\n"))
}
