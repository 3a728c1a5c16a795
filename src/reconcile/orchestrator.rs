//! Run sequencing
//!
//! A run is a linear sequence of phases with early exits. Each phase reads
//! what earlier phases established and hands the next phase everything it
//! needs, so no state lives on the client.

use crate::checks::{CheckContext, Checker};
use crate::config::RunOptions;
use crate::error::{Error, RemoteOutcome, Result};
use crate::platform::RemoteRepository;
use crate::reconcile::branch::{BranchPlan, BranchResolution, plan_integration_branch, resolve_branch};
use crate::reconcile::finalize::{FinalizeOutcome, FinalizeRequest, finalize};
use crate::reconcile::fork::resolve_working_target;
use crate::reconcile::locate::{ProposalState, escalate_ambiguity, locate_proposals};
use crate::reconcile::Reporter;
use crate::types::{Actor, NoteLog, RepoId, RepositoryInfo, WorkingTarget};
use chrono::NaiveDate;
use std::fmt;
use tracing::debug;

/// Default branch assumed when the platform doesn't report one
pub const FALLBACK_DEFAULT_BRANCH: &str = "master";

/// Dependencies and settings for one run
pub struct RunContext<'a> {
    /// Remote client
    pub platform: &'a dyn RemoteRepository,
    /// Run narration
    pub reporter: &'a dyn Reporter,
    /// Run options
    pub options: RunOptions,
    /// Date used to name a new integration branch
    pub today: NaiveDate,
}

/// Facts established once the repository is validated and the bot identified
#[derive(Debug, Clone)]
pub struct Session {
    /// Canonical repository
    pub repo: RepoId,
    /// Canonical repository metadata
    pub info: RepositoryInfo,
    /// Canonical default branch
    pub default_branch: String,
    /// Authenticated bot
    pub actor: Actor,
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Authenticated bot
    pub actor: Actor,
    /// Repository that received writes
    pub target: WorkingTarget,
    /// Integration branch
    pub branch: String,
    /// What happened to the integration branch
    pub branch_resolution: BranchResolution,
    /// Notes collected from the checkers
    pub notes: NoteLog,
    /// How finalization ended
    pub outcome: FinalizeOutcome,
}

/// Position in the run state machine
#[derive(Debug)]
pub enum Phase {
    /// Fetch the canonical repository; missing means exit
    Validate,
    /// Identify the bot
    Authenticate {
        /// Repository metadata from validation
        info: RepositoryInfo,
    },
    /// Find the bot's open pull requests
    Locate(Session),
    /// Several open pull requests: raise an issue and stop
    Escalate(Session, ProposalState),
    /// Pick the repository receiving writes
    ResolveTarget(Session, BranchPlan),
    /// Make sure the integration branch exists
    ResolveBranch(Session, BranchPlan, WorkingTarget),
    /// Run the content checkers
    Check(Session, BranchPlan, WorkingTarget, BranchResolution),
    /// Open the pull request, if warranted
    Finalize(Session, BranchPlan, WorkingTarget, BranchResolution, NoteLog),
    /// Terminal state
    Done(Box<RunReport>),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::Authenticate { .. } => "authenticate",
            Self::Locate(..) => "locate",
            Self::Escalate(..) => "escalate",
            Self::ResolveTarget(..) => "resolve-target",
            Self::ResolveBranch(..) => "resolve-branch",
            Self::Check(..) => "check",
            Self::Finalize(..) => "finalize",
            Self::Done(_) => "done",
        };
        f.write_str(name)
    }
}

/// Drives a run through its phases
pub struct Reconciler<'a> {
    ctx: RunContext<'a>,
    repo: RepoId,
    checkers: &'a [Box<dyn Checker>],
}

impl<'a> Reconciler<'a> {
    /// Prepare a run against `repo`
    pub const fn new(ctx: RunContext<'a>, repo: RepoId, checkers: &'a [Box<dyn Checker>]) -> Self {
        Self {
            ctx,
            repo,
            checkers,
        }
    }

    /// Run every phase to completion
    ///
    /// Fatal conditions come back as errors after their messages have been
    /// reported. Remote resources created before the failure are left in place.
    pub async fn run(&self) -> Result<RunReport> {
        let mut phase = Phase::Validate;
        loop {
            debug!(%phase, "entering phase");
            phase = match self.step(phase).await? {
                Phase::Done(report) => return Ok(*report),
                next => next,
            };
        }
    }

    /// Perform one transition
    pub async fn step(&self, phase: Phase) -> Result<Phase> {
        let platform = self.ctx.platform;
        let reporter = self.ctx.reporter;
        let options = &self.ctx.options;

        match phase {
            Phase::Validate => {
                match RemoteOutcome::from_result(platform.get_repository(&self.repo).await) {
                    RemoteOutcome::Success(info) => {
                        reporter.info("Starting process...").await;
                        Ok(Phase::Authenticate { info })
                    }
                    RemoteOutcome::NotFound => {
                        reporter
                            .fire("That is not a valid GitHub repository!")
                            .await;
                        Err(Error::RepositoryNotFound(self.repo.to_string()))
                    }
                    RemoteOutcome::PermissionDenied(reason) => Err(Error::PermissionDenied(reason)),
                    RemoteOutcome::Failed(err) => Err(err),
                }
            }

            Phase::Authenticate { info } => {
                let actor = platform.current_user().await?;
                reporter
                    .info(&format!(
                        "Authenticated as {}. Looking if I already created a pull request.",
                        actor.login
                    ))
                    .await;
                let default_branch = info
                    .default_branch
                    .clone()
                    .unwrap_or_else(|| FALLBACK_DEFAULT_BRANCH.to_string());
                Ok(Phase::Locate(Session {
                    repo: self.repo.clone(),
                    info,
                    default_branch,
                    actor,
                }))
            }

            Phase::Locate(session) => {
                let state = locate_proposals(platform, &session.repo, &session.actor).await?;
                match state {
                    ProposalState::Many(_) => Ok(Phase::Escalate(session, state)),
                    ProposalState::One(ref pr) => {
                        reporter
                            .info(&format!("Existing pull request found: {}", pr.html_url))
                            .await;
                        let plan = self.plan_branch(&state).await?;
                        Ok(Phase::ResolveTarget(session, plan))
                    }
                    ProposalState::None => {
                        reporter.info("No existing pull request found").await;
                        let plan = self.plan_branch(&state).await?;
                        Ok(Phase::ResolveTarget(session, plan))
                    }
                }
            }

            Phase::Escalate(session, state) => {
                let ProposalState::Many(proposals) = state else {
                    return Err(Error::Internal(
                        "escalation entered without ambiguous proposals".to_string(),
                    ));
                };
                Err(escalate_ambiguity(
                    platform,
                    &session.repo,
                    &proposals,
                    options.dry_run,
                    reporter,
                )
                .await)
            }

            Phase::ResolveTarget(session, plan) => {
                let target = resolve_working_target(
                    platform,
                    &session.repo,
                    &session.actor,
                    options,
                    reporter,
                )
                .await?;
                Ok(Phase::ResolveBranch(session, plan, target))
            }

            Phase::ResolveBranch(session, plan, target) => {
                reporter
                    .info(&format!(
                        "Looking for last commit sha of {}/{}",
                        session.repo, session.default_branch
                    ))
                    .await;
                let tip = platform
                    .get_branch(&session.repo, &session.default_branch)
                    .await?
                    .tip;
                let resolution =
                    resolve_branch(platform, &target, &plan.name, &tip, options, reporter).await?;
                Ok(Phase::Check(session, plan, target, resolution))
            }

            Phase::Check(session, plan, target, resolution) => {
                let check_ctx = CheckContext {
                    platform,
                    reporter,
                    canonical: &session.repo,
                    info: &session.info,
                    default_branch: &session.default_branch,
                    target: &target,
                    branch: &plan.name,
                    branch_exists: resolution.exists(),
                    options,
                };

                let mut notes = NoteLog::new();
                for checker in self.checkers {
                    let found = checker.check(&check_ctx).await?;
                    debug!(checker = checker.name(), count = found.len(), "checker finished");
                    notes.extend(found);
                }
                Ok(Phase::Finalize(session, plan, target, resolution, notes))
            }

            Phase::Finalize(session, plan, target, resolution, notes) => {
                let request = FinalizeRequest {
                    canonical: &session.repo,
                    default_branch: &session.default_branch,
                    target: &target,
                    branch: &plan.name,
                    existing: plan.existing.as_ref(),
                };
                let outcome = finalize(platform, &request, &notes, options, reporter).await?;
                Ok(Phase::Done(Box::new(RunReport {
                    actor: session.actor,
                    target,
                    branch: plan.name,
                    branch_resolution: resolution,
                    notes,
                    outcome,
                })))
            }

            Phase::Done(report) => Ok(Phase::Done(report)),
        }
    }

    async fn plan_branch(&self, state: &ProposalState) -> Result<BranchPlan> {
        let plan = plan_integration_branch(state, self.ctx.today);
        if let Err(Error::ForeignBranch(_)) = plan {
            self.ctx
                .reporter
                .fire("Existing branch doesn't look like it was made by this tool! Abort!")
                .await;
        }
        plan
    }
}

/// Run a full reconciliation of `repo`
pub async fn reconcile(
    ctx: RunContext<'_>,
    repo: RepoId,
    checkers: &[Box<dyn Checker>],
) -> Result<RunReport> {
    Reconciler::new(ctx, repo, checkers).run().await
}
