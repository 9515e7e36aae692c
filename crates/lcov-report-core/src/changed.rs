//! Per-file coverage restricted to the files a pull request touches.
//!
//! `lcov --list` prints a three-line table header followed by one row per
//! source file, columns separated by `|`. A row is kept when its first
//! column, trimmed, ends with the repository-relative path of a changed
//! file.
//!
//! Known limitation: the suffix match is a heuristic. A changed file with
//! no executable lines, or whose path lcov abbreviates or normalises
//! differently, is silently left out.

use crate::context::RepoRef;
use crate::error::Result;
use crate::merge::MergedTrace;
use crate::platform::ReviewPlatform;
use crate::runner::ProcessRunner;
use crate::stage::LcovStage;
use crate::summary::strip_banner;
use tracing::debug;

/// Number of leading listing lines that form the table header.
pub const HEADER_LINES: usize = 3;

/// Text used in place of the table when no changed file has coverage rows.
pub const NOT_APPLICABLE: &str = " n/a";

/// Result of filtering the per-file listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangedFilesDetail {
    /// No row matched any changed file.
    NotApplicable,

    /// Table header plus matching rows, in listing order.
    Table { header: Vec<String>, rows: Vec<String> },
}

impl ChangedFilesDetail {
    /// Text to splice after `Files changed coverage rate:`.
    pub fn render(&self) -> String {
        match self {
            ChangedFilesDetail::NotApplicable => NOT_APPLICABLE.to_string(),
            ChangedFilesDetail::Table { header, rows } => {
                let mut text = String::from("\n");
                let lines: Vec<&str> = header.iter().chain(rows).map(String::as_str).collect();
                text.push_str(&lines.join("\n"));
                text
            }
        }
    }
}

/// First `|`-separated column of a listing row, trimmed.
pub fn file_column(row: &str) -> &str {
    row.trim().split('|').next().unwrap_or_default().trim()
}

/// Keep the header and the rows whose file column ends with a changed path.
///
/// `lines` is the listing without its banner line.
pub fn filter_listing<S: AsRef<str>>(lines: &[&str], changed_files: &[S]) -> ChangedFilesDetail {
    // A listing shorter than the header has no rows; it renders as n/a
    // rather than as a bare partial header.
    let split = HEADER_LINES.min(lines.len());
    let (header, body) = lines.split_at(split);

    let rows: Vec<String> = body
        .iter()
        .filter(|row| {
            let column = file_column(row);
            changed_files
                .iter()
                .any(|changed| column.ends_with(AsRef::<str>::as_ref(changed)))
        })
        .map(|row| row.to_string())
        .collect();

    if rows.is_empty() {
        return ChangedFilesDetail::NotApplicable;
    }

    ChangedFilesDetail::Table {
        header: header.iter().map(|l| l.to_string()).collect(),
        rows,
    }
}

/// List per-file coverage of the merged trace and keep the rows of the
/// files changed by pull request `number`.
pub async fn changed_files_detail(
    runner: &dyn ProcessRunner,
    platform: &dyn ReviewPlatform,
    repo: &RepoRef,
    number: u64,
    trace: &MergedTrace,
    branch_coverage: bool,
) -> Result<ChangedFilesDetail> {
    let stage = LcovStage::List {
        tracefile: trace.path().to_path_buf(),
    };
    let output = stage.execute(runner, branch_coverage).await?.combined();

    let changed_files = platform.list_changed_files(repo, number).await?;
    debug!(count = changed_files.len(), "fetched changed files");

    let lines = strip_banner(&output);
    Ok(filter_listing(&lines, &changed_files))
}
