//! Pull request comment composition and posting.

use crate::changed::ChangedFilesDetail;
use crate::context::{PullRequestRef, RunContext};
use crate::error::Result;
use crate::gate::GateVerdict;
use crate::obs;
use crate::platform::ReviewPlatform;

/// Why no comment is posted for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No token configured.
    NoToken,
    /// The run was not triggered by a pull request.
    NotPullRequest,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoToken => "no github token configured",
            SkipReason::NotPullRequest => "event is not a pull request",
        }
    }
}

/// Decide whether the run comments at all. The token is checked first.
pub fn should_comment(token: Option<&str>, ctx: &RunContext) -> std::result::Result<(), SkipReason> {
    match token {
        Some(t) if !t.trim().is_empty() => {}
        _ => return Err(SkipReason::NoToken),
    }
    if !ctx.is_pull_request() {
        return Err(SkipReason::NotPullRequest);
    }
    Ok(())
}

/// Render the comment body.
///
/// The failure notice is appended only when `verdict` failed.
pub fn render_comment(
    ctx: &RunContext,
    pr: &PullRequestRef,
    summary: &str,
    detail: &ChangedFilesDetail,
    verdict: &GateVerdict,
) -> String {
    let mut body = format!(
        "# [LCOV](https://github.com/Dup4/lcov-action) Report

---

> commit [<code>{short}</code>]({number}/commits/{sha}) during [{workflow} #{run_number}](../actions/runs/{run_id})

<pre>

{summary}

Files changed coverage rate:{detail}

</pre>
",
        short = pr.short_sha(),
        number = pr.number,
        sha = pr.head_sha,
        workflow = ctx.workflow,
        run_number = ctx.run_number,
        run_id = ctx.run_id,
        summary = summary,
        detail = detail.render(),
    );

    if verdict.is_failure() {
        body.push_str(&format!("\n:no_entry: {}", verdict.message));
    }

    body
}

/// Create the comment on the pull request. Every call adds a new comment.
pub async fn post_comment(
    platform: &dyn ReviewPlatform,
    ctx: &RunContext,
    pr: &PullRequestRef,
    body: &str,
) -> Result<()> {
    platform.create_comment(&ctx.repo, pr.number, body).await?;
    obs::emit_comment_posted(&ctx.repo.to_string(), pr.number, body.len());
    Ok(())
}
