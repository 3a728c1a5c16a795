//! Integration branch naming and creation

use crate::config::RunOptions;
use crate::error::{Error, RemoteOutcome, Result};
use crate::platform::RemoteRepository;
use crate::reconcile::{ProposalState, Reporter};
use crate::types::{Branch, CommitPointer, PullRequest, WorkingTarget};
use chrono::NaiveDate;
use tracing::debug;

/// Marker every branch made by this tool carries
pub const BRANCH_MARKER: &str = "docs";

/// Branch name for a run started on `date`
pub fn dated_branch_name(date: NaiveDate) -> String {
    format!("{BRANCH_MARKER}/{}", date.format("%Y-%m-%d"))
}

/// Whether an existing head ref looks like one of ours
///
/// This is a substring test, not a prefix test: any ref containing the
/// marker is accepted.
pub fn is_tool_branch(name: &str) -> bool {
    name.contains(BRANCH_MARKER)
}

/// Branch chosen for the run, plus the pull request it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPlan {
    /// Integration branch name
    pub name: String,
    /// Open pull request whose head is this branch, if any
    pub existing: Option<PullRequest>,
}

/// Decide the integration branch from the located pull requests (pure)
pub fn plan_integration_branch(state: &ProposalState, today: NaiveDate) -> Result<BranchPlan> {
    match state {
        ProposalState::None => Ok(BranchPlan {
            name: dated_branch_name(today),
            existing: None,
        }),
        ProposalState::One(pr) if is_tool_branch(&pr.head_ref) => Ok(BranchPlan {
            name: pr.head_ref.clone(),
            existing: Some(pr.clone()),
        }),
        ProposalState::One(pr) => Err(Error::ForeignBranch(pr.head_ref.clone())),
        ProposalState::Many(prs) => Err(Error::AmbiguousProposals(
            prs.iter().map(|pr| pr.number).collect(),
        )),
    }
}

/// What happened to the integration branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchResolution {
    /// Branch was created at the canonical tip
    Created,
    /// Branch already existed and was left alone
    Existing(Branch),
    /// Branch was missing and dry run prevented creating it
    Skipped,
}

impl BranchResolution {
    /// Whether the branch exists on the working target after resolution
    pub const fn exists(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Make sure `branch` exists on the working target
///
/// A missing branch is created at `tip`; an existing one is never reset.
/// Creation failures are fatal.
pub async fn resolve_branch(
    platform: &dyn RemoteRepository,
    target: &WorkingTarget,
    branch: &str,
    tip: &CommitPointer,
    options: &RunOptions,
    reporter: &dyn Reporter,
) -> Result<BranchResolution> {
    let repo = target.repo();

    let Some(existing) = RemoteOutcome::from_result(platform.get_branch(repo, branch).await)
        .found()?
    else {
        reporter
            .info(&format!(
                "Creating new branch on {repo}: {branch} using last sha {}",
                tip.short()
            ))
            .await;

        if options.dry_run {
            reporter
                .info("Branch not created, because dry run.")
                .await;
            return Ok(BranchResolution::Skipped);
        }

        return match RemoteOutcome::from_result(platform.create_branch(repo, branch, tip).await) {
            RemoteOutcome::Success(()) => {
                debug!(branch, "integration branch created");
                Ok(BranchResolution::Created)
            }
            RemoteOutcome::PermissionDenied(reason) => {
                reporter
                    .fire("Unable to create a new branch. Do you have access?")
                    .await;
                Err(Error::BranchCreation {
                    branch: branch.to_string(),
                    reason,
                })
            }
            RemoteOutcome::NotFound => {
                reporter
                    .fire(&format!("Unable to create a new branch. Does {repo} exist?"))
                    .await;
                Err(Error::BranchCreation {
                    branch: branch.to_string(),
                    reason: format!("{repo} not found"),
                })
            }
            RemoteOutcome::Failed(err) => {
                reporter.fire("Unable to create a new branch.").await;
                Err(Error::BranchCreation {
                    branch: branch.to_string(),
                    reason: err.to_string(),
                })
            }
        };
    };

    reporter
        .info(&format!(
            "Using existing branch on {repo}: {branch} at sha {}",
            existing.tip.short()
        ))
        .await;
    Ok(BranchResolution::Existing(existing))
}
