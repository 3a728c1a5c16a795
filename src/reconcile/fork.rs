//! Choosing the repository that receives writes

use crate::config::RunOptions;
use crate::error::{RemoteOutcome, Result};
use crate::platform::RemoteRepository;
use crate::reconcile::Reporter;
use crate::types::{Actor, RepoId, WorkingTarget};
use tracing::{debug, warn};

/// Resolve the working target for this run
///
/// Without `fork` the canonical repository is used. Otherwise an existing
/// fork owned by `actor` is reused, or one is requested. The platform's
/// name for the fork wins, since forks can be renamed. Fork creation is
/// best effort: a refusal is reported and `<actor>/<name>` is still
/// returned, so later branch writes fail loudly if it never materialized.
pub async fn resolve_working_target(
    platform: &dyn RemoteRepository,
    canonical: &RepoId,
    actor: &Actor,
    options: &RunOptions,
    reporter: &dyn Reporter,
) -> Result<WorkingTarget> {
    if !options.fork {
        return Ok(WorkingTarget::Canonical(canonical.clone()));
    }

    let fork_id = canonical.with_owner(&actor.login);
    let forks = platform.list_forks(canonical).await?;

    if let Some(fork) = forks.into_iter().find(|fork| fork.repo.owner == actor.login) {
        reporter
            .info(&format!("Using existing fork: {}.", fork.repo))
            .await;
        return Ok(WorkingTarget::Fork(fork.repo));
    }

    if options.dry_run {
        reporter
            .fire("Refusing to create fork, because dry run.")
            .await;
        return Ok(WorkingTarget::Fork(fork_id));
    }

    match RemoteOutcome::from_result(platform.create_fork(canonical).await) {
        RemoteOutcome::Success(fork) => {
            debug!(fork = %fork.repo, "fork requested");
            reporter
                .info(&format!("Created new fork: {}.", fork.repo))
                .await;
            return Ok(WorkingTarget::Fork(fork.repo));
        }
        RemoteOutcome::PermissionDenied(reason) => {
            warn!(%reason, "fork creation refused");
            reporter
                .fire(&format!(
                    "Unable to create a new fork for {}! Does the token allow forking?",
                    actor.login
                ))
                .await;
        }
        RemoteOutcome::NotFound => {
            reporter
                .fire(&format!("Unable to create a new fork for {}!", actor.login))
                .await;
        }
        RemoteOutcome::Failed(err) => {
            warn!(error = %err, "fork creation failed");
            reporter
                .fire(&format!(
                    "Unable to create a new fork for {}! {err}",
                    actor.login
                ))
                .await;
        }
    }

    Ok(WorkingTarget::Fork(fork_id))
}
