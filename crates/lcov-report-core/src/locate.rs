//! Trace file discovery.

use crate::error::{ReportError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expand a coverage-files pattern into the matching regular files.
///
/// The pattern may hold several globs separated by newlines; blank lines
/// and lines starting with `#` are skipped. A line starting with `!` is an
/// exclusion: any path it matches is dropped, whichever line found it.
/// Exclusions compare against paths as the globs produce them, so an
/// absolute include needs an absolute exclusion. Each glob's matches come
/// in lexical order and a path matched twice is kept once. No match is not
/// an error.
pub fn locate_trace_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut includes = Vec::new();
    let mut excludes = Vec::new();

    for line in pattern.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.strip_prefix('!') {
            Some(negated) => excludes.push(compile_pattern(negated.trim())?),
            None => includes.push(line),
        }
    }

    let mut seen = BTreeSet::new();
    let mut files = Vec::new();
    for include in includes {
        for path in glob_files(include)? {
            if excludes.iter().any(|ex| ex.matches_path(&path)) {
                continue;
            }
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    debug!(
        pattern = %pattern,
        excluded = excludes.len(),
        matched = files.len(),
        "located trace files"
    );
    Ok(files)
}

/// Every regular file below `root`, recursively, in lexical order.
pub fn list_files_under(root: &Path) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&root.to_string_lossy());
    let pattern = Path::new(&escaped).join("**").join("*");
    glob_files(&pattern.to_string_lossy())
}

fn compile_pattern(pattern: &str) -> Result<glob::Pattern> {
    glob::Pattern::new(pattern).map_err(|e| ReportError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

fn glob_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| ReportError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| ReportError::Io(e.into_error()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}
