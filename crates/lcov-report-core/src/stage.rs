//! lcov tool invocations.

use crate::error::Result;
use crate::obs;
use crate::runner::{CommandSpec, ProcessOutput, ProcessRunner};
use std::path::{Path, PathBuf};

/// Runtime-configuration flag enabling branch accounting in `lcov`.
pub const LCOV_BRANCH_RC: &str = "lcov_branch_coverage=1";

/// Runtime-configuration flag enabling branch rendering in `genhtml`.
pub const GENHTML_BRANCH_RC: &str = "genhtml_branch_coverage=1";

/// External commands the pipeline relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LcovStage {
    /// sudo apt-get install -y lcov
    Install,

    /// lcov --add-tracefile A --add-tracefile B ... --output-file OUT
    Merge {
        tracefiles: Vec<PathBuf>,
        output: PathBuf,
    },

    /// lcov --summary TRACEFILE
    Summary { tracefile: PathBuf },

    /// lcov --list TRACEFILE
    List { tracefile: PathBuf },

    /// genhtml TRACEFILES... --output-directory DIR
    GenHtml {
        tracefiles: Vec<PathBuf>,
        output_dir: PathBuf,
    },
}

impl LcovStage {
    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            LcovStage::Install => "install_lcov",
            LcovStage::Merge { .. } => "lcov_merge",
            LcovStage::Summary { .. } => "lcov_summary",
            LcovStage::List { .. } => "lcov_list",
            LcovStage::GenHtml { .. } => "genhtml",
        }
    }

    /// Build the command line, with branch accounting when `branch_coverage` is set.
    pub fn command(&self, branch_coverage: bool) -> CommandSpec {
        match self {
            LcovStage::Install => CommandSpec::new(
                "sudo",
                vec![
                    "apt-get".to_string(),
                    "install".to_string(),
                    "-y".to_string(),
                    "lcov".to_string(),
                ],
            ),
            LcovStage::Merge { tracefiles, output } => {
                let mut args = Vec::with_capacity(tracefiles.len() * 2 + 4);
                for tracefile in tracefiles {
                    args.push("--add-tracefile".to_string());
                    args.push(path_arg(tracefile));
                }
                push_rc(&mut args, branch_coverage, LCOV_BRANCH_RC);
                args.push("--output-file".to_string());
                args.push(path_arg(output));
                CommandSpec::new("lcov", args)
            }
            LcovStage::Summary { tracefile } => {
                let mut args = vec!["--summary".to_string()];
                push_rc(&mut args, branch_coverage, LCOV_BRANCH_RC);
                args.push(path_arg(tracefile));
                CommandSpec::new("lcov", args)
            }
            LcovStage::List { tracefile } => {
                let mut args = vec!["--list".to_string()];
                push_rc(&mut args, branch_coverage, LCOV_BRANCH_RC);
                args.push(path_arg(tracefile));
                CommandSpec::new("lcov", args)
            }
            LcovStage::GenHtml {
                tracefiles,
                output_dir,
            } => {
                let mut args: Vec<String> = tracefiles.iter().map(|p| path_arg(p)).collect();
                args.push("--output-directory".to_string());
                args.push(path_arg(output_dir));
                push_rc(&mut args, branch_coverage, GENHTML_BRANCH_RC);
                CommandSpec::new("genhtml", args)
            }
        }
    }
}

impl LcovStage {
    /// Execute the stage and fail on a non-zero exit.
    ///
    /// Emits `stage.started` before spawning and `stage.finished` once the
    /// process has exited, whatever its status.
    pub async fn execute(
        &self,
        runner: &dyn ProcessRunner,
        branch_coverage: bool,
    ) -> Result<ProcessOutput> {
        self.run_command(runner, self.command(branch_coverage)).await
    }

    /// Like [`execute`](Self::execute), running from `cwd`.
    pub async fn execute_in(
        &self,
        runner: &dyn ProcessRunner,
        branch_coverage: bool,
        cwd: &Path,
    ) -> Result<ProcessOutput> {
        self.run_command(runner, self.command(branch_coverage).in_dir(cwd))
            .await
    }

    async fn run_command(
        &self,
        runner: &dyn ProcessRunner,
        command: CommandSpec,
    ) -> Result<ProcessOutput> {
        obs::emit_stage_started(self.name(), &command.display());

        let output = runner.run(&command).await?;
        obs::emit_stage_finished(self.name(), output.exit_code, output.duration_ms);

        output.require_success(&command.program)
    }
}

fn push_rc(args: &mut Vec<String>, enabled: bool, rc: &str) {
    if enabled {
        args.push("--rc".to_string());
        args.push(rc.to_string());
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(LcovStage::Install.name(), "install_lcov");
        assert_eq!(
            LcovStage::Summary {
                tracefile: "a".into()
            }
            .name(),
            "lcov_summary"
        );
    }

    #[test]
    fn test_merge_repeats_add_tracefile() {
        let stage = LcovStage::Merge {
            tracefiles: vec!["a.info".into(), "b.info".into()],
            output: "/tmp/out/lcov.info".into(),
        };
        let cmd = stage.command(false);
        assert_eq!(cmd.program, "lcov");
        assert_eq!(
            cmd.args,
            strings(&[
                "--add-tracefile",
                "a.info",
                "--add-tracefile",
                "b.info",
                "--output-file",
                "/tmp/out/lcov.info",
            ])
        );
    }

    #[test]
    fn test_merge_with_branch_coverage() {
        let stage = LcovStage::Merge {
            tracefiles: vec!["a.info".into()],
            output: "out.info".into(),
        };
        let cmd = stage.command(true);
        assert_eq!(
            cmd.args,
            strings(&[
                "--add-tracefile",
                "a.info",
                "--rc",
                "lcov_branch_coverage=1",
                "--output-file",
                "out.info",
            ])
        );
    }

    #[test]
    fn test_summary_and_list_put_tracefile_last() {
        let summary = LcovStage::Summary {
            tracefile: "m.info".into(),
        }
        .command(true);
        assert_eq!(
            summary.args,
            strings(&["--summary", "--rc", "lcov_branch_coverage=1", "m.info"])
        );

        let list = LcovStage::List {
            tracefile: "m.info".into(),
        }
        .command(false);
        assert_eq!(list.args, strings(&["--list", "m.info"]));
    }

    #[test]
    fn test_genhtml_uses_genhtml_rc() {
        let cmd = LcovStage::GenHtml {
            tracefiles: vec!["a.info".into()],
            output_dir: "html".into(),
        }
        .command(true);
        assert_eq!(cmd.program, "genhtml");
        assert_eq!(
            cmd.args,
            strings(&[
                "a.info",
                "--output-directory",
                "html",
                "--rc",
                "genhtml_branch_coverage=1",
            ])
        );
    }

    #[test]
    fn test_install_command() {
        let cmd = LcovStage::Install.command(true);
        assert_eq!(cmd.program, "sudo");
        assert_eq!(cmd.args, strings(&["apt-get", "install", "-y", "lcov"]));
    }
}
