//! Reconciliation engine
//!
//! Decides, from the remote state, which branch a run writes to and whether
//! a pull request is opened, reused, or refused as ambiguous:
//!
//! 1. Locate - classify the bot's open pull requests (none / one / many)
//! 2. Escalate - several open pull requests raise an issue and end the run
//! 3. Fork - choose the working target, reusing the bot's fork
//! 4. Branch - ensure the dated (or inherited) integration branch exists
//! 5. Finalize - open the pull request only when the branch carries commits
//!
//! Every create is preceded by a read, so running twice converges on the
//! same fork, branch and pull request.

mod branch;
mod finalize;
mod fork;
mod locate;
mod orchestrator;
mod report;

pub use branch::{
    BRANCH_MARKER, BranchPlan, BranchResolution, dated_branch_name, is_tool_branch,
    plan_integration_branch, resolve_branch,
};
pub use finalize::{FinalizeOutcome, FinalizeRequest, build_pull_request, finalize};
pub use fork::resolve_working_target;
pub use locate::{ProposalState, escalate_ambiguity, locate_proposals};
pub use orchestrator::{
    FALLBACK_DEFAULT_BRANCH, Phase, Reconciler, RunContext, RunReport, Session, reconcile,
};
pub use report::{NoopReporter, Reporter};
