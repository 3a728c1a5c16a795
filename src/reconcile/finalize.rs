//! Opening the pull request at the end of a run

use crate::config::RunOptions;
use crate::error::{RemoteOutcome, Result};
use crate::messages;
use crate::platform::RemoteRepository;
use crate::reconcile::Reporter;
use crate::types::{NewPullRequest, NoteLog, PullRequest, RepoId, WorkingTarget};
use tracing::{debug, warn};

/// How the run ended with respect to the pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Integration branch is the default branch; nothing to propose
    OnDefaultBranch,
    /// Integration branch tip equals the default branch tip
    NoChanges,
    /// A pull request for the branch is already open
    AlreadyOpen(PullRequest),
    /// Dry run: the pull request would have been opened
    DryRun(NewPullRequest),
    /// Pull request opened
    Created(PullRequest),
    /// Opening the pull request failed; reported, not fatal
    Failed(String),
}

/// Where the pull request goes and what it proposes
#[derive(Debug, Clone, Copy)]
pub struct FinalizeRequest<'a> {
    /// Canonical repository (the pull request base lives here)
    pub canonical: &'a RepoId,
    /// Canonical default branch
    pub default_branch: &'a str,
    /// Repository holding the integration branch
    pub target: &'a WorkingTarget,
    /// Integration branch
    pub branch: &'a str,
    /// Open pull request already carrying this branch
    pub existing: Option<&'a PullRequest>,
}

/// Build the pull request parameters (pure)
pub fn build_pull_request(request: &FinalizeRequest<'_>, notes: &NoteLog) -> NewPullRequest {
    NewPullRequest {
        title: messages::PR_TITLE.to_string(),
        head: format!("{}:{}", request.target.owner(), request.branch),
        base: request.default_branch.to_string(),
        body: messages::pr_body(notes),
    }
}

/// Open a pull request if the integration branch carries new commits
///
/// Reads of the two branch tips propagate errors; the creation call itself
/// is best effort.
pub async fn finalize(
    platform: &dyn RemoteRepository,
    request: &FinalizeRequest<'_>,
    notes: &NoteLog,
    options: &RunOptions,
    reporter: &dyn Reporter,
) -> Result<FinalizeOutcome> {
    if request.branch == request.default_branch {
        reporter
            .info("No changes (you've run this already), or there is some other issue.")
            .await;
        return Ok(FinalizeOutcome::OnDefaultBranch);
    }

    let base_tip = platform
        .get_branch(request.canonical, request.default_branch)
        .await?
        .tip;
    let head_tip = RemoteOutcome::from_result(
        platform
            .get_branch(request.target.repo(), request.branch)
            .await,
    )
    .found()?
    .map(|branch| branch.tip);

    debug!(base = %base_tip, head = ?head_tip, "comparing tips");
    if head_tip.is_none() && options.dry_run {
        reporter
            .info(&format!(
                "Pull request not created, because dry run: {} was never created.",
                request.branch
            ))
            .await;
        return Ok(FinalizeOutcome::NoChanges);
    }
    if head_tip.as_ref().is_none_or(|tip| *tip == base_tip) {
        reporter
            .fire("Unable to create PR because there is no content.")
            .await;
        return Ok(FinalizeOutcome::NoChanges);
    }

    if let Some(existing) = request.existing {
        reporter
            .info(&format!("Pull request already open: {}", existing.html_url))
            .await;
        return Ok(FinalizeOutcome::AlreadyOpen(existing.clone()));
    }

    let new_pr = build_pull_request(request, notes);
    reporter.info("Creating pull request").await;

    if options.dry_run {
        reporter
            .info("Pull request not created, because dry run.")
            .await;
        return Ok(FinalizeOutcome::DryRun(new_pr));
    }

    match platform.create_pull_request(request.canonical, &new_pr).await {
        Ok(pr) => {
            reporter
                .info(&format!("Pull request created: {}", pr.html_url))
                .await;
            Ok(FinalizeOutcome::Created(pr))
        }
        Err(err) => {
            warn!(error = %err, "pull request creation failed");
            reporter
                .fire(&format!("Unable to create PR: {err}"))
                .await;
            Ok(FinalizeOutcome::Failed(err.to_string()))
        }
    }
}
