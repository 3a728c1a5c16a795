//! Reconcile command - check a repository and deliver one pull request

use crate::cli::CliReporter;
use crate::cli::context::CommandContext;
use crate::cli::style::Stylize;
use anstream::println;
use manifest_sync::checks::{Checker, ManifestChecker};
use manifest_sync::error::Result;
use manifest_sync::reconcile::{FinalizeOutcome, RunContext, reconcile};
use manifest_sync::types::RepoId;
use std::path::PathBuf;

/// Options for the reconcile command
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Work on a fork
    pub fork: bool,
    /// Dry run - report instead of writing
    pub dry_run: bool,
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// GitHub Enterprise host
    pub host: Option<String>,
    /// Manifest path override
    pub manifest: Option<String>,
}

/// Run the reconcile command
pub async fn run_reconcile(repo: RepoId, args: RunArgs, reporter: &CliReporter) -> Result<()> {
    let ctx = CommandContext::new(args.config.as_deref(), args.host.as_deref()).await?;
    let options = ctx
        .config
        .run_options(
            args.fork,
            args.dry_run,
            args.manifest.as_deref(),
            args.host.as_deref(),
        );

    let checkers: Vec<Box<dyn Checker>> =
        vec![Box::new(ManifestChecker::new(options.manifest_path.clone()))];

    let run_ctx = RunContext {
        platform: &ctx.platform,
        reporter,
        options,
        today: chrono::Utc::now().date_naive(),
    };
    let report = reconcile(run_ctx, repo, &checkers).await?;

    println!();
    println!(
        "{} {} on {}",
        "Branch".muted(),
        report.branch.accent(),
        report.target.accent()
    );
    for note in report.notes.notes() {
        println!("  {} {note}", "-".muted());
    }
    let summary = match &report.outcome {
        FinalizeOutcome::Created(pr) => format!("Opened {}", pr.html_url),
        FinalizeOutcome::AlreadyOpen(pr) => format!("Updated {}", pr.html_url),
        FinalizeOutcome::DryRun(_) => "Dry run complete".to_string(),
        FinalizeOutcome::NoChanges | FinalizeOutcome::OnDefaultBranch => {
            "Nothing to propose".to_string()
        }
        FinalizeOutcome::Failed(reason) => format!("Pull request not opened: {reason}"),
    };
    println!("{}", summary.muted());

    Ok(())
}
