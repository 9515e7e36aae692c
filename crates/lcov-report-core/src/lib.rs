//! lcov-report core - coverage reporting for pull requests
//!
//! Provides a report pipeline that:
//! - Locates lcov trace files and renders them to an HTML artifact
//! - Merges them and gates the run on a minimum total line coverage
//! - Comments the summary and the changed files' coverage on the pull request
//!
//! External tools, the review platform and the artifact store are reached
//! through the `ProcessRunner`, `ReviewPlatform` and `ArtifactStore` traits.

pub mod artifact;
pub mod changed;
pub mod comment;
pub mod config;
pub mod context;
pub mod error;
pub mod fakes;
pub mod gate;
pub mod locate;
pub mod merge;
pub mod obs;
pub mod pipeline;
pub mod platform;
pub mod render;
pub mod runner;
pub mod stage;
pub mod summary;
pub mod telemetry;
pub mod total;

// Re-export key types
pub use changed::{filter_listing, ChangedFilesDetail};
pub use comment::{render_comment, should_comment, SkipReason};
pub use config::{coverage_too_low, parse_flag, parse_minimum_coverage, ReportConfig};
pub use context::{PullRequestRef, RepoRef, RunContext, PULL_REQUEST_EVENT};
pub use error::{ReportError, Result};
pub use gate::{CoverageGate, GateVerdict};
pub use merge::MergedTrace;
pub use pipeline::{CommentOutcome, PipelineResult, ReportPipeline};
pub use platform::{ArtifactStore, ReviewPlatform};
pub use runner::{CommandSpec, ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use stage::LcovStage;
pub use telemetry::init_tracing;
pub use total::{total_coverage_of, LineTotals};
