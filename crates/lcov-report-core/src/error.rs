//! Error types for the coverage report pipeline

use thiserror::Error;

/// Errors that abort a report run.
///
/// A coverage value below the configured minimum is not an error; it is
/// reported through [`crate::GateVerdict`].
#[derive(Error, Debug)]
pub enum ReportError {
    /// External tool exited non-zero
    #[error("{tool} exited with code {exit_code}: {output}")]
    ToolFailed {
        tool: String,
        exit_code: i32,
        output: String,
    },

    /// Merge requested without any trace file
    #[error("No coverage files matched; refusing to merge an empty set of trace files")]
    NoTraceFiles,

    /// Coverage glob could not be parsed
    #[error("Invalid coverage file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Bad configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Review-request data required for commenting is absent
    #[error("Pull request context is missing: {0}")]
    MissingPullRequest(String),

    /// Review platform call failed
    #[error("Review platform request failed: {0}")]
    Platform(String),

    /// Artifact upload failed
    #[error("Artifact upload failed: {0}")]
    Artifact(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ReportError>;
