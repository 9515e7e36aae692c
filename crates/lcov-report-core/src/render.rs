//! HTML report rendering.

use crate::error::{ReportError, Result};
use crate::locate::list_files_under;
use crate::runner::ProcessRunner;
use crate::stage::LcovStage;
use std::path::{Path, PathBuf};
use tracing::info;

/// Subdirectory of the scratch directory receiving the HTML pages.
pub const HTML_DIR: &str = "html";

/// A rendered static-HTML report tree.
#[derive(Debug, Clone)]
pub struct ReportBundle {
    /// Root of the tree.
    pub root: PathBuf,

    /// Every file of the tree, absolute.
    pub files: Vec<PathBuf>,
}

/// Render the trace files to `<out_dir>/html` with genhtml run from
/// `working_dir`, so that source paths in the traces resolve.
pub async fn render_html(
    runner: &dyn ProcessRunner,
    tracefiles: &[PathBuf],
    working_dir: &Path,
    out_dir: &Path,
    branch_coverage: bool,
) -> Result<ReportBundle> {
    if tracefiles.is_empty() {
        return Err(ReportError::NoTraceFiles);
    }

    let root = absolute(&out_dir.join(HTML_DIR))?;
    let tracefiles = tracefiles
        .iter()
        .map(|p| absolute(p))
        .collect::<Result<Vec<_>>>()?;

    let stage = LcovStage::GenHtml {
        tracefiles,
        output_dir: root.clone(),
    };
    stage
        .execute_in(runner, branch_coverage, working_dir)
        .await?;

    let files = list_files_under(&root)?;
    info!(root = %root.display(), files = files.len(), "rendered HTML report");
    Ok(ReportBundle { root, files })
}

/// genhtml runs from another directory, so relative paths must be anchored
/// at the current one first.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeProcessRunner;

    #[tokio::test]
    async fn test_render_runs_in_working_dir_and_collects_files() {
        let scratch = tempfile::tempdir().unwrap();
        let runner = FakeProcessRunner::new().genhtml_writes(&["index.html", "src/main.c.gcov.html"]);

        let bundle = render_html(
            &runner,
            &[PathBuf::from("/cov/a.info")],
            Path::new("app"),
            scratch.path(),
            true,
        )
        .await
        .expect("render");

        assert_eq!(bundle.root, scratch.path().join("html"));
        assert_eq!(bundle.files.len(), 2);

        let calls = runner.calls();
        assert_eq!(calls[0].program, "genhtml");
        assert_eq!(calls[0].cwd.as_deref(), Some(Path::new("app")));
        assert!(calls[0].args.contains(&"genhtml_branch_coverage=1".to_string()));
    }

    #[tokio::test]
    async fn test_render_anchors_relative_tracefiles() {
        let scratch = tempfile::tempdir().unwrap();
        let runner = FakeProcessRunner::new();

        render_html(
            &runner,
            &[PathBuf::from("coverage/lcov.info")],
            Path::new("./"),
            scratch.path(),
            false,
        )
        .await
        .expect("render");

        let first = PathBuf::from(&runner.calls()[0].args[0]);
        assert!(first.is_absolute());
        assert!(first.ends_with("coverage/lcov.info"));
    }

    #[tokio::test]
    async fn test_render_failure_propagates() {
        let scratch = tempfile::tempdir().unwrap();
        let runner = FakeProcessRunner::new().fail(
            "genhtml",
            "--output-directory",
            "genhtml: ERROR: cannot read src/main.c",
        );

        let err = render_html(
            &runner,
            &[PathBuf::from("/cov/a.info")],
            Path::new("./"),
            scratch.path(),
            false,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
