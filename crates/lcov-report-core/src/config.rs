//! Report configuration and input normalisation.

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Artifact name used when none is configured.
pub const DEFAULT_ARTIFACT_NAME: &str = "coverage-report";

/// Validated configuration for one report run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Glob pattern locating the trace files.
    pub coverage_files: String,

    /// Directory genhtml runs from, so that source paths resolve.
    pub working_directory: PathBuf,

    /// Name of the uploaded HTML artifact.
    pub artifact_name: String,

    /// Minimum total line coverage, in whole percent.
    pub minimum_coverage: i64,

    /// Raw minimum as configured, quoted in the failure message.
    pub minimum_coverage_raw: String,

    /// Token for the review platform; `None` disables commenting.
    pub github_token: Option<String>,

    /// Enable branch accounting flags on every lcov invocation.
    pub branch_coverage: bool,

    /// Install lcov through apt before running.
    pub install_lcov: bool,
}

impl ReportConfig {
    /// Build a configuration from raw input strings.
    ///
    /// Values are trimmed. An empty token disables commenting, an empty
    /// working directory means `./`, and branch coverage is enabled only by
    /// the literal `true`.
    pub fn from_inputs(
        coverage_files: &str,
        working_directory: &str,
        artifact_name: &str,
        minimum_coverage: &str,
        github_token: &str,
        branch_coverage: &str,
    ) -> Result<Self> {
        let coverage_files = coverage_files.trim();
        if coverage_files.is_empty() {
            return Err(ReportError::Config(
                "coverage-files must not be empty".to_string(),
            ));
        }

        let working_directory = match working_directory.trim() {
            "" => PathBuf::from("./"),
            dir => PathBuf::from(dir),
        };

        let artifact_name = match artifact_name.trim() {
            "" => DEFAULT_ARTIFACT_NAME.to_string(),
            name => name.to_string(),
        };

        let minimum_coverage_raw = minimum_coverage.trim().to_string();
        let minimum = parse_minimum_coverage(&minimum_coverage_raw)?;

        let github_token = Some(github_token.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self {
            coverage_files: coverage_files.to_string(),
            working_directory,
            artifact_name,
            minimum_coverage: minimum,
            minimum_coverage_raw,
            github_token,
            branch_coverage: parse_flag(branch_coverage),
            install_lcov: false,
        })
    }

    /// Enable the apt install step.
    pub fn with_install_lcov(mut self, install: bool) -> Self {
        self.install_lcov = install;
        self
    }

    /// Message reported when the gate fails.
    pub fn failure_message(&self) -> String {
        coverage_too_low(&self.minimum_coverage_raw)
    }
}

/// Gate failure message quoting the minimum as the user wrote it.
pub fn coverage_too_low(minimum_raw: &str) -> String {
    format!(
        "The code coverage is too low. Expected at least {}.",
        minimum_raw.trim()
    )
}

/// Parse a boolean input: only `true` (after trimming) enables.
pub fn parse_flag(value: &str) -> bool {
    value.trim() == "true"
}

/// Parse the minimum coverage with truncating integer semantics.
///
/// Leading whitespace and an optional sign are accepted, then the leading
/// decimal digits are used and anything after them is ignored, so `80.9`
/// reads as `80`. An empty value means `0`.
pub fn parse_minimum_coverage(value: &str) -> Result<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }

    let (negative, rest) = match value.as_bytes()[0] {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };

    let digits: &str = {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };

    if digits.is_empty() {
        return Err(ReportError::Config(format!(
            "minimum-coverage '{}' is not a number",
            value
        )));
    }

    let magnitude: i64 = digits.parse().map_err(|_| {
        ReportError::Config(format!("minimum-coverage '{}' is out of range", value))
    })?;

    Ok(if negative { -magnitude } else { magnitude })
}
