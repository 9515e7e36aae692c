//! In-memory fakes for the pipeline capabilities (testing only)
//!
//! Provides `FakeProcessRunner`, `MemoryReviewPlatform` and
//! `MemoryArtifactStore`, which satisfy the trait contracts without
//! spawning processes or touching the network.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::context::RepoRef;
use crate::error::{ReportError, Result};
use crate::platform::{ArtifactStore, ReviewPlatform};
use crate::runner::{CommandSpec, ProcessOutput, ProcessRunner};

// ---------------------------------------------------------------------------
// FakeProcessRunner
// ---------------------------------------------------------------------------

type Effect = Arc<dyn Fn(&CommandSpec) -> std::io::Result<()> + Send + Sync>;

#[derive(Clone)]
struct Rule {
    program: String,
    needle: String,
    output: ProcessOutput,
    effect: Option<Effect>,
}

impl Rule {
    fn matches(&self, command: &CommandSpec) -> bool {
        command.program == self.program && command.args.iter().any(|a| a == &self.needle)
    }
}

/// Scripted process runner.
///
/// A rule matches a command by program name and one argument it must
/// contain. The most recently added matching rule wins; unmatched commands
/// succeed with empty output. Every command is recorded.
#[derive(Default)]
pub struct FakeProcessRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl FakeProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `stdout`.
    pub fn respond(self, program: &str, needle: &str, stdout: &str) -> Self {
        self.respond_streams(program, needle, stdout, "")
    }

    /// Succeed with separate stdout and stderr.
    pub fn respond_streams(mut self, program: &str, needle: &str, stdout: &str, stderr: &str) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            needle: needle.to_string(),
            output: ProcessOutput {
                exit_code: 0,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                duration_ms: 1,
            },
            effect: None,
        });
        self
    }

    /// Exit with code 1 and `stderr`.
    pub fn fail(mut self, program: &str, needle: &str, stderr: &str) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            needle: needle.to_string(),
            output: ProcessOutput {
                exit_code: 1,
                stdout: String::new(),
                stderr: stderr.to_string(),
                duration_ms: 1,
            },
            effect: None,
        });
        self
    }

    /// Succeed and run `effect` against the command first.
    pub fn effect<F>(mut self, program: &str, needle: &str, effect: F) -> Self
    where
        F: Fn(&CommandSpec) -> std::io::Result<()> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            program: program.to_string(),
            needle: needle.to_string(),
            output: ProcessOutput {
                exit_code: 0,
                duration_ms: 1,
                ..Default::default()
            },
            effect: Some(Arc::new(effect)),
        });
        self
    }

    /// Make `lcov --add-tracefile ... --output-file OUT` write `trace` to OUT.
    pub fn lcov_merge_writes(self, trace: &str) -> Self {
        let trace = trace.to_string();
        self.effect("lcov", "--add-tracefile", move |cmd| {
            let out = arg_after(cmd, "--output-file")?;
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, &trace)
        })
    }

    /// Make `genhtml ... --output-directory DIR` create `files` under DIR.
    pub fn genhtml_writes(self, files: &[&str]) -> Self {
        let files: Vec<String> = files.iter().map(|f| f.to_string()).collect();
        self.effect("genhtml", "--output-directory", move |cmd| {
            let dir = arg_after(cmd, "--output-directory")?;
            for file in &files {
                let path = dir.join(file);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, "<html></html>")?;
            }
            Ok(())
        })
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands run for `program`.
    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }
}

fn arg_after(cmd: &CommandSpec, flag: &str) -> std::io::Result<PathBuf> {
    cmd.args
        .iter()
        .position(|a| a == flag)
        .and_then(|i| cmd.args.get(i + 1))
        .map(PathBuf::from)
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("missing {flag}")))
}

#[async_trait]
impl ProcessRunner for FakeProcessRunner {
    async fn run(&self, command: &CommandSpec) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(command.clone());

        let rule = self.rules.iter().rev().find(|r| r.matches(command));
        match rule {
            Some(rule) => {
                if let Some(effect) = &rule.effect {
                    (effect.as_ref())(command)?;
                }
                Ok(rule.output.clone())
            }
            None => Ok(ProcessOutput::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryReviewPlatform
// ---------------------------------------------------------------------------

/// A comment created through [`MemoryReviewPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedComment {
    pub repo: RepoRef,
    pub number: u64,
    pub body: String,
}

/// In-memory review platform with a fixed changed-file list.
#[derive(Debug, Default)]
pub struct MemoryReviewPlatform {
    changed_files: Vec<String>,
    comment_error: Option<String>,
    list_calls: Mutex<u64>,
    comment_calls: Mutex<u64>,
    comments: Mutex<Vec<PostedComment>>,
}

impl MemoryReviewPlatform {
    pub fn new(changed_files: &[&str]) -> Self {
        Self {
            changed_files: changed_files.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Reject every comment with `message`.
    pub fn failing_comments(mut self, message: &str) -> Self {
        self.comment_error = Some(message.to_string());
        self
    }

    pub fn comments(&self) -> Vec<PostedComment> {
        self.comments.lock().unwrap().clone()
    }

    /// Number of changed-file listings requested.
    pub fn list_calls(&self) -> u64 {
        *self.list_calls.lock().unwrap()
    }

    /// Number of comment creations attempted, failed ones included.
    pub fn comment_calls(&self) -> u64 {
        *self.comment_calls.lock().unwrap()
    }

    /// Whether any call reached the platform.
    pub fn touched(&self) -> bool {
        self.list_calls() > 0 || self.comment_calls() > 0
    }
}

#[async_trait]
impl ReviewPlatform for MemoryReviewPlatform {
    async fn list_changed_files(&self, _repo: &RepoRef, _number: u64) -> Result<Vec<String>> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(self.changed_files.clone())
    }

    async fn create_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        *self.comment_calls.lock().unwrap() += 1;
        if let Some(message) = &self.comment_error {
            return Err(ReportError::Platform(message.clone()));
        }
        self.comments.lock().unwrap().push(PostedComment {
            repo: repo.clone(),
            number,
            body: body.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryArtifactStore
// ---------------------------------------------------------------------------

/// An upload recorded by [`MemoryArtifactStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub name: String,
    /// Paths relative to the upload root.
    pub files: Vec<PathBuf>,
}

/// In-memory artifact store that records uploads.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    error: Option<String>,
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every upload with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn upload(&self, name: &str, files: &[PathBuf], root: &Path) -> Result<()> {
        if let Some(message) = &self.error {
            return Err(ReportError::Artifact(message.clone()));
        }

        let mut relative = Vec::with_capacity(files.len());
        for file in files {
            let rel = file.strip_prefix(root).map_err(|_| {
                ReportError::Artifact(format!(
                    "{} is not under {}",
                    file.display(),
                    root.display()
                ))
            })?;
            relative.push(rel.to_path_buf());
        }

        self.uploads.lock().unwrap().push(RecordedUpload {
            name: name.to_string(),
            files: relative,
        });
        Ok(())
    }
}
