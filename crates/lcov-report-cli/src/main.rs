//! lcov-report - coverage reporting for GitHub pull requests
//!
//! The `lcov-report` command runs inside a GitHub Actions job.
//!
//! ## Commands
//!
//! - `run`: merge trace files, upload the HTML report, comment on the pull
//!   request and fail below the minimum coverage
//! - `total`: print the total line coverage of one trace file
//!
//! Every `run` option can be given through the matching `INPUT_*` variable
//! the Actions runner exports for action inputs.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gh_actions_client::{
    api_url, load_run_context, process_env, ActionsArtifactStore, GitHubClient,
};
use lcov_report_core::{
    coverage_too_low, init_tracing, parse_flag, parse_minimum_coverage, total_coverage_of,
    CommentOutcome, CoverageGate, PipelineResult, ReportConfig, ReportPipeline,
    TokioProcessRunner,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "lcov-report")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Coverage report and gate for GitHub pull requests", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full report for the current workflow run
    Run(RunArgs),

    /// Print the total line coverage of a trace file
    Total {
        /// lcov trace file
        tracefile: PathBuf,

        /// Fail when the total is below this value
        #[arg(long)]
        minimum: Option<String>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Glob pattern(s) of lcov trace files, one per line
    #[arg(long, env = "INPUT_COVERAGE-FILES")]
    coverage_files: String,

    /// Directory genhtml runs in
    #[arg(long, env = "INPUT_WORKING-DIRECTORY", default_value = "./")]
    working_directory: String,

    /// Name of the uploaded HTML artifact
    #[arg(long, env = "INPUT_ARTIFACT-NAME", default_value = "coverage-report")]
    artifact_name: String,

    /// Minimum total line coverage, in percent
    #[arg(long, env = "INPUT_MINIMUM-COVERAGE", default_value = "0")]
    minimum_coverage: String,

    /// Token used to comment on the pull request; empty disables commenting
    #[arg(long, env = "INPUT_GITHUB-TOKEN", default_value = "", hide_env_values = true)]
    github_token: String,

    /// `true` enables branch coverage
    #[arg(long, env = "INPUT_BRANCH-COVERAGE", default_value = "false")]
    branch_coverage: String,

    /// `true` installs lcov through apt first
    #[arg(long, env = "INPUT_INSTALL-LCOV", default_value = "false")]
    install_lcov: String,
}

impl RunArgs {
    fn to_config(&self) -> lcov_report_core::Result<ReportConfig> {
        Ok(ReportConfig::from_inputs(
            &self.coverage_files,
            &self.working_directory,
            &self.artifact_name,
            &self.minimum_coverage,
            &self.github_token,
            &self.branch_coverage,
        )?
        .with_install_lcov(parse_flag(&self.install_lcov)))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let outcome = match cli.command {
        Commands::Run(args) => cmd_run(&args).await,
        Commands::Total { tracefile, minimum } => {
            cmd_total(&tracefile, minimum.as_deref()).await
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("::error::{}", escape_workflow_data(&format!("{err:#}")));
            ExitCode::FAILURE
        }
    }
}

async fn cmd_run(args: &RunArgs) -> Result<()> {
    let config = args.to_config().context("Invalid action input")?;
    let ctx = load_run_context(process_env).context("Failed to read the workflow run context")?;

    let token = config.github_token.as_deref().unwrap_or_default();
    let platform = GitHubClient::new(&api_url(process_env), token)
        .context("Failed to create GitHub client")?;
    let artifacts =
        ActionsArtifactStore::from_env().context("Artifact service is not available")?;

    let pipeline = ReportPipeline::new(
        Arc::new(TokioProcessRunner),
        Arc::new(platform),
        Arc::new(artifacts),
    );

    info!(repo = %ctx.repo, run_id = ctx.run_id, "Running coverage report");
    let result = pipeline.run(&config, &ctx).await?;
    print_result(&result);

    if result.success() {
        Ok(())
    } else {
        anyhow::bail!("{}", result.verdict.message)
    }
}

fn print_result(result: &PipelineResult) {
    println!("Trace files: {}", result.tracefiles.len());
    println!("Artifact files: {}", result.artifact_files);
    println!(
        "Total coverage: {}% (minimum {}%)",
        result.verdict.total, result.verdict.minimum
    );
    match &result.comment {
        CommentOutcome::Posted { number } => println!("Commented on #{number}"),
        CommentOutcome::Skipped(reason) => println!("Comment skipped: {}", reason.as_str()),
    }
    println!("Duration: {}ms", result.duration_ms);
}

async fn cmd_total(tracefile: &Path, minimum: Option<&str>) -> Result<()> {
    let total = total_coverage_of(tracefile)
        .await
        .with_context(|| format!("Failed to read trace file {}", tracefile.display()))?;
    println!("{total}");

    if let Some(raw) = minimum {
        let verdict = check_minimum(total, raw)?;
        if verdict.is_failure() {
            anyhow::bail!("{}", verdict.message);
        }
    }
    Ok(())
}

fn check_minimum(total: f64, raw: &str) -> Result<lcov_report_core::GateVerdict> {
    let minimum = parse_minimum_coverage(raw).context("Invalid minimum coverage")?;
    Ok(CoverageGate::evaluate(total, minimum, &coverage_too_low(raw)))
}

/// Escape a message for a workflow command's data part.
fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
