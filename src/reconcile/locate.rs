//! Finding the bot's open pull requests, and escalating when there are several

use crate::error::{Error, Result};
use crate::messages;
use crate::platform::RemoteRepository;
use crate::reconcile::Reporter;
use crate::types::{Actor, PullRequest, RepoId};
use tracing::{debug, warn};

/// Open pull requests authored by the bot, classified by cardinality
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalState {
    /// No open pull request
    None,
    /// Exactly one, with its head ref resolved
    One(PullRequest),
    /// Two or more; the run cannot continue
    Many(Vec<PullRequest>),
}

impl ProposalState {
    /// Classify search results (pure)
    pub fn classify(mut proposals: Vec<PullRequest>) -> Self {
        match proposals.len() {
            0 => Self::None,
            1 => Self::One(proposals.remove(0)),
            _ => Self::Many(proposals),
        }
    }
}

/// Look up open pull requests by `actor` against `repo`
///
/// Search results don't carry the head branch, so a single match is
/// re-fetched to fill it in. Performs reads only.
pub async fn locate_proposals(
    platform: &dyn RemoteRepository,
    repo: &RepoId,
    actor: &Actor,
) -> Result<ProposalState> {
    let found = platform
        .search_open_pull_requests(repo, &actor.login)
        .await?;
    debug!(count = found.len(), "located open pull requests");

    match ProposalState::classify(found) {
        ProposalState::One(summary) => {
            let full = platform.get_pull_request(repo, summary.number).await?;
            Ok(ProposalState::One(full))
        }
        other => Ok(other),
    }
}

/// Raise a tracking issue listing the conflicting pull requests
///
/// Always yields the [`Error::AmbiguousProposals`] that ends the run. In dry
/// run the issue is only reported. A failure to open the issue is reported
/// but doesn't change the outcome.
pub async fn escalate_ambiguity(
    platform: &dyn RemoteRepository,
    repo: &RepoId,
    proposals: &[PullRequest],
    dry_run: bool,
    reporter: &dyn Reporter,
) -> Error {
    let numbers: Vec<u64> = proposals.iter().map(|pr| pr.number).collect();
    reporter
        .fire("I don't know how to handle more than one pull request. Creating an issue.")
        .await;

    if dry_run {
        reporter.info("Issue not created, because dry run.").await;
    } else {
        match platform
            .create_issue(repo, messages::ISSUE_TITLE, &messages::issue_body(&numbers))
            .await
        {
            Ok(issue) => {
                reporter
                    .info(&format!("Issue created: {}", issue.html_url))
                    .await;
            }
            Err(e) => {
                warn!(error = %e, "failed to open tracking issue");
                reporter
                    .warn(&format!("Unable to create the tracking issue: {e}"))
                    .await;
            }
        }
    }

    Error::AmbiguousProposals(numbers)
}
