//! Integration tests for the report pipeline with in-memory fakes.

use lcov_report_core::fakes::{FakeProcessRunner, MemoryArtifactStore, MemoryReviewPlatform};
use lcov_report_core::{
    CommentOutcome, PullRequestRef, RepoRef, ReportConfig, ReportError, ReportPipeline,
    RunContext, SkipReason,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const SUMMARY: &str = "Reading tracefile /tmp/x/lcov.info\n\
Summary coverage rate:\n  lines......: 92.0% (92 of 100 lines)\n  functions..: 90.0% (9 of 10 functions)\n  branches...: no data found\n";

const LISTING: &str = "Reading tracefile /tmp/x/lcov.info\n\
               |Lines       |Functions  |Branches    \n\
Filename       |Rate     Num|Rate    Num|Rate     Num\n\
=====================================================\n\
src/lib.rs     |95.0%     60|100%      6|    -      0\n\
src/main.rs    |87.5%     40|75.0%     4|    -      0\n\
=====================================================\n\
         Total:|92.0%    100|90.0%    10|    -      0\n";

/// Merged trace with the given line counters.
fn merged_trace(found: u64, hit: u64) -> String {
    format!("TN:\nSF:src/lib.rs\nLF:{found}\nLH:{hit}\nend_of_record\n")
}

struct Fixture {
    _dir: TempDir,
    scratch: PathBuf,
    pattern: String,
}

fn fixture(trace_names: &[&str]) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let coverage = dir.path().join("coverage");
    std::fs::create_dir_all(&coverage).unwrap();
    for name in trace_names {
        std::fs::write(coverage.join(name), merged_trace(10, 5)).unwrap();
    }
    let scratch = dir.path().join("scratch");
    std::fs::create_dir_all(&scratch).unwrap();
    Fixture {
        pattern: format!("{}/*.info", coverage.display()),
        scratch,
        _dir: dir,
    }
}

fn config(pattern: &str, minimum: &str, token: &str) -> ReportConfig {
    ReportConfig::from_inputs(pattern, "", "coverage-html", minimum, token, "false")
        .expect("valid config")
}

fn pr_context() -> RunContext {
    RunContext {
        repo: RepoRef::new("octo", "widgets"),
        event_name: "pull_request".to_string(),
        pull_request: Some(PullRequestRef {
            number: 12,
            head_sha: "a1b2c3d4e5f6a7b8c9d0".to_string(),
        }),
        workflow: "CI".to_string(),
        run_number: 7,
        run_id: 555,
        action: "__lcov".to_string(),
    }
}

fn push_context() -> RunContext {
    RunContext {
        event_name: "push".to_string(),
        pull_request: None,
        ..pr_context()
    }
}

fn scripted_runner(found: u64, hit: u64) -> FakeProcessRunner {
    FakeProcessRunner::new()
        .genhtml_writes(&["index.html", "src/index.html", "src/lib.rs.gcov.html"])
        .lcov_merge_writes(&merged_trace(found, hit))
        .respond("lcov", "--summary", SUMMARY)
        .respond("lcov", "--list", LISTING)
}

fn pipeline(
    runner: &Arc<FakeProcessRunner>,
    platform: &Arc<MemoryReviewPlatform>,
    store: &Arc<MemoryArtifactStore>,
) -> ReportPipeline {
    ReportPipeline::new(runner.clone(), platform.clone(), store.clone())
}

/// Test: two trace files, 92% against a minimum of 90 passes and comments without a failure notice
#[tokio::test]
async fn test_passing_run_posts_comment() {
    let fx = fixture(&["unit.info", "integration.info"]);
    let runner = Arc::new(scripted_runner(100, 92));
    let platform = Arc::new(MemoryReviewPlatform::new(&["src/main.rs", "README.md"]));
    let store = Arc::new(MemoryArtifactStore::new());

    let result = pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "90", "ghp_token"), &pr_context(), fx.scratch.clone())
        .await
        .expect("pipeline failed");

    assert!(result.success(), "92% should pass a 90% gate");
    assert_eq!(result.verdict.total, 92.0);
    assert_eq!(result.tracefiles.len(), 2);
    assert_eq!(result.comment, CommentOutcome::Posted { number: 12 });

    // Every lcov invocation works on the same merged trace
    let merged = fx.scratch.join("lcov.info");
    let merged_arg = merged.to_string_lossy().to_string();
    let lcov_calls = runner.calls_to("lcov");
    assert_eq!(lcov_calls.len(), 3, "merge, summary and list");
    assert_eq!(lcov_calls[0].args.last(), Some(&merged_arg));
    assert_eq!(lcov_calls[1].args.last(), Some(&merged_arg));
    assert_eq!(lcov_calls[2].args.last(), Some(&merged_arg));
    assert_eq!(
        lcov_calls[0]
            .args
            .iter()
            .filter(|a| a.as_str() == "--add-tracefile")
            .count(),
        2
    );

    // HTML report rendered first and uploaded under the configured name
    assert_eq!(runner.calls()[0].program, "genhtml");
    let uploads = store.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].name, "coverage-html");
    assert_eq!(uploads[0].files.len(), 3);
    assert_eq!(result.artifact_files, 3);

    let comments = platform.comments();
    assert_eq!(comments.len(), 1);
    let body = &comments[0].body;
    assert_eq!(comments[0].number, 12);
    assert!(body.contains("<code>a1b2c3d</code>"));
    assert!(body.contains("lines......: 92.0%"));
    assert!(!body.contains("Reading tracefile"));
    assert!(body.contains("src/main.rs    |87.5%"));
    assert!(!body.contains("src/lib.rs     |95.0%"));
    assert!(!body.contains("Total:"));
    assert!(!body.contains(":no_entry:"));
}

/// Test: 79% against "80" fails the gate and the comment carries the notice
#[tokio::test]
async fn test_below_minimum_fails_after_commenting() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(100, 79));
    let platform = Arc::new(MemoryReviewPlatform::new(&["src/lib.rs"]));
    let store = Arc::new(MemoryArtifactStore::new());

    let result = pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "80", "ghp_token"), &pr_context(), fx.scratch.clone())
        .await
        .expect("gate failure is not a pipeline error");

    assert!(!result.success());
    assert_eq!(
        result.verdict.message,
        "The code coverage is too low. Expected at least 80."
    );

    let comments = platform.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0]
        .body
        .ends_with("\n:no_entry: The code coverage is too low. Expected at least 80."));
}

/// Test: exactly at the minimum passes
#[tokio::test]
async fn test_equal_to_minimum_passes() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(10, 8));
    let platform = Arc::new(MemoryReviewPlatform::new(&[]));
    let store = Arc::new(MemoryArtifactStore::new());

    let result = pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "80", ""), &push_context(), fx.scratch.clone())
        .await
        .expect("pipeline failed");

    assert_eq!(result.verdict.total, 80.0);
    assert!(result.success());
}

/// Test: no trace file matched fails fast instead of reporting 0%
#[tokio::test]
async fn test_no_trace_files_fails_fast() {
    let fx = fixture(&[]);
    let runner = Arc::new(scripted_runner(0, 0));
    let platform = Arc::new(MemoryReviewPlatform::new(&["src/lib.rs"]));
    let store = Arc::new(MemoryArtifactStore::new());

    let err = pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "0", "ghp_token"), &pr_context(), fx.scratch.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::NoTraceFiles));
    assert!(runner.calls_to("lcov").is_empty());
    assert!(store.uploads().is_empty());
    assert!(!platform.touched());
}

/// Test: empty token never reaches the review platform, even on a failing pull request run
#[tokio::test]
async fn test_empty_token_skips_platform() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(100, 10));
    let platform = Arc::new(MemoryReviewPlatform::new(&["src/lib.rs"]));
    let store = Arc::new(MemoryArtifactStore::new());

    let result = pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "90", "   "), &pr_context(), fx.scratch.clone())
        .await
        .expect("pipeline failed");

    assert!(!result.success());
    assert_eq!(result.comment, CommentOutcome::Skipped(SkipReason::NoToken));
    assert!(!platform.touched());
    // Summary and listing only feed the comment
    assert_eq!(runner.calls_to("lcov").len(), 1);
}

/// Test: a non pull request event skips commenting even with a token
#[tokio::test]
async fn test_push_event_skips_comment() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(100, 95));
    let platform = Arc::new(MemoryReviewPlatform::new(&["src/lib.rs"]));
    let store = Arc::new(MemoryArtifactStore::new());

    let result = pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "90", "ghp_token"), &push_context(), fx.scratch.clone())
        .await
        .expect("pipeline failed");

    assert!(result.success());
    assert_eq!(
        result.comment,
        CommentOutcome::Skipped(SkipReason::NotPullRequest)
    );
    assert!(!platform.touched());
    assert_eq!(store.uploads().len(), 1, "artifact is published regardless");
}

/// Test: no changed file has coverage rows, the comment shows n/a
#[tokio::test]
async fn test_unrelated_changes_render_not_applicable() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(100, 92));
    let platform = Arc::new(MemoryReviewPlatform::new(&["docs/guide.md"]));
    let store = Arc::new(MemoryArtifactStore::new());

    pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "0", "ghp_token"), &pr_context(), fx.scratch.clone())
        .await
        .expect("pipeline failed");

    let body = &platform.comments()[0].body;
    assert!(body.contains("Files changed coverage rate: n/a\n"));
    assert!(!body.contains("Filename"));
}

/// Test: comment creation failure fails the run
#[tokio::test]
async fn test_comment_failure_propagates() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(100, 92));
    let platform =
        Arc::new(MemoryReviewPlatform::new(&["src/lib.rs"]).failing_comments("HTTP 403"));
    let store = Arc::new(MemoryArtifactStore::new());

    let err = pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "0", "ghp_token"), &pr_context(), fx.scratch.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Platform(ref m) if m.contains("403")));
}

/// Test: a failing merge aborts before anything is posted
#[tokio::test]
async fn test_merge_failure_aborts() {
    let fx = fixture(&["broken.info"]);
    let runner = Arc::new(
        scripted_runner(100, 92).fail("lcov", "--add-tracefile", "lcov: ERROR: no valid records"),
    );
    let platform = Arc::new(MemoryReviewPlatform::new(&["src/lib.rs"]));
    let store = Arc::new(MemoryArtifactStore::new());

    let err = pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "0", "ghp_token"), &pr_context(), fx.scratch.clone())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no valid records"));
    assert!(!platform.touched());
}

/// Test: an artifact upload failure aborts before the merge
#[tokio::test]
async fn test_artifact_failure_aborts() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(100, 92));
    let platform = Arc::new(MemoryReviewPlatform::new(&["src/lib.rs"]));
    let store = Arc::new(MemoryArtifactStore::failing("upload rejected"));

    let err = pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "0", "ghp_token"), &pr_context(), fx.scratch.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Artifact(_)));
    assert!(runner.calls_to("lcov").is_empty());
}

/// Test: a pull_request event without payload cannot be commented on
#[tokio::test]
async fn test_pull_request_without_payload_errors() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(100, 92));
    let platform = Arc::new(MemoryReviewPlatform::new(&["src/lib.rs"]));
    let store = Arc::new(MemoryArtifactStore::new());
    let ctx = RunContext {
        pull_request: None,
        ..pr_context()
    };

    let err = pipeline(&runner, &platform, &store)
        .run_in(&config(&fx.pattern, "0", "ghp_token"), &ctx, fx.scratch.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::MissingPullRequest(_)));
}

/// Test: branch coverage flags reach every tool invocation
#[tokio::test]
async fn test_branch_coverage_flags() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(100, 92));
    let platform = Arc::new(MemoryReviewPlatform::new(&["src/lib.rs"]));
    let store = Arc::new(MemoryArtifactStore::new());
    let config = ReportConfig::from_inputs(&fx.pattern, "", "", "0", "ghp_token", "true")
        .expect("valid config");

    pipeline(&runner, &platform, &store)
        .run_in(&config, &pr_context(), fx.scratch.clone())
        .await
        .expect("pipeline failed");

    for call in runner.calls() {
        let expected = if call.program == "genhtml" {
            "genhtml_branch_coverage=1"
        } else {
            "lcov_branch_coverage=1"
        };
        assert!(
            call.args.iter().any(|a| a == expected),
            "{} is missing {}",
            call.display(),
            expected
        );
    }
}

/// Test: the install step runs first when enabled
#[tokio::test]
async fn test_install_step() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(100, 92));
    let platform = Arc::new(MemoryReviewPlatform::new(&[]));
    let store = Arc::new(MemoryArtifactStore::new());
    let config = config(&fx.pattern, "0", "").with_install_lcov(true);

    pipeline(&runner, &platform, &store)
        .run_in(&config, &push_context(), fx.scratch.clone())
        .await
        .expect("pipeline failed");

    let first = &runner.calls()[0];
    assert_eq!(first.program, "sudo");
    assert_eq!(first.args, vec!["apt-get", "install", "-y", "lcov"]);
}

/// Test: `run` provisions and removes its own scratch directory
#[tokio::test]
async fn test_run_uses_temporary_scratch() {
    let fx = fixture(&["unit.info"]);
    let runner = Arc::new(scripted_runner(100, 92));
    let platform = Arc::new(MemoryReviewPlatform::new(&[]));
    let store = Arc::new(MemoryArtifactStore::new());

    let result = pipeline(&runner, &platform, &store)
        .run(&config(&fx.pattern, "0", ""), &push_context())
        .await
        .expect("pipeline failed");
    assert!(result.success());

    let merge = &runner.calls_to("lcov")[0];
    let merged = Path::new(merge.args.last().unwrap());
    assert!(merged.ends_with("lcov.info"));
    assert!(!merged.exists(), "scratch directory is removed after the run");
}

/// Test: a multi-line pattern with a comment and an exclusion decides which traces are merged, in order
#[tokio::test]
async fn test_multi_line_pattern_with_exclusion_drives_merge() {
    let fx = fixture(&["unit.info", "integration.info", "flaky.info"]);
    let coverage = fx.scratch.parent().unwrap().join("coverage");
    let pattern = format!(
        "{dir}/unit.info\n# everything else, minus the flaky suite\n{dir}/*.info\n!{dir}/flaky.info",
        dir = coverage.display()
    );
    let runner = Arc::new(scripted_runner(100, 92));
    let platform = Arc::new(MemoryReviewPlatform::new(&[]));
    let store = Arc::new(MemoryArtifactStore::new());

    let result = pipeline(&runner, &platform, &store)
        .run_in(&config(&pattern, "0", ""), &push_context(), fx.scratch.clone())
        .await
        .expect("pipeline failed");

    let expected = vec![coverage.join("unit.info"), coverage.join("integration.info")];
    assert_eq!(result.tracefiles, expected);

    let merge = &runner.calls_to("lcov")[0];
    let added: Vec<PathBuf> = merge
        .args
        .windows(2)
        .filter(|pair| pair[0] == "--add-tracefile")
        .map(|pair| PathBuf::from(&pair[1]))
        .collect();
    assert_eq!(added, expected);

    let genhtml = &runner.calls_to("genhtml")[0];
    assert!(!genhtml.args.iter().any(|a| a.ends_with("flaky.info")));
}
