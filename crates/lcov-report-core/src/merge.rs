//! Trace file merging.

use crate::error::{ReportError, Result};
use crate::runner::ProcessRunner;
use crate::stage::LcovStage;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the merged trace inside the scratch directory.
pub const MERGED_TRACE_FILE: &str = "lcov.info";

/// The single trace file produced by one merge.
///
/// Summary, per-file listing and total coverage of a run are all derived
/// from the same `MergedTrace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTrace {
    path: PathBuf,
}

impl MergedTrace {
    /// Wrap an existing trace file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Merge `tracefiles` into `<out_dir>/lcov.info`.
///
/// Refuses an empty input so that a pattern matching nothing fails the run
/// instead of reporting 0%.
pub async fn merge_traces(
    runner: &dyn ProcessRunner,
    tracefiles: &[PathBuf],
    out_dir: &Path,
    branch_coverage: bool,
) -> Result<MergedTrace> {
    if tracefiles.is_empty() {
        return Err(ReportError::NoTraceFiles);
    }

    let output = out_dir.join(MERGED_TRACE_FILE);
    let stage = LcovStage::Merge {
        tracefiles: tracefiles.to_vec(),
        output: output.clone(),
    };
    stage.execute(runner, branch_coverage).await?;

    info!(inputs = tracefiles.len(), output = %output.display(), "merged trace files");
    Ok(MergedTrace { path: output })
}
