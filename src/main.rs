//! msync - keep package.json in sync with GitHub

mod cli;

use clap::Parser;
use manifest_sync::types::RepoId;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Sync npm manifest metadata with GitHub and open a single pull request
#[derive(Parser, Debug)]
#[command(name = "msync", version, about)]
struct Cli {
    /// Repository to check (owner/name); defaults to $GITHUB_REPOSITORY
    #[arg(env = "GITHUB_REPOSITORY")]
    repo: String,

    /// Work on a fork owned by the authenticated user
    #[arg(long)]
    fork: bool,

    /// Dry run: report what would change without writing to GitHub
    #[arg(long, visible_alias = "dry-run")]
    test: bool,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// GitHub Enterprise host
    #[arg(long)]
    host: Option<String>,

    /// Manifest path inside the repository
    #[arg(long)]
    manifest: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("manifest_sync=debug,msync=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let reporter = cli::CliReporter;
    let repo: RepoId = match args.repo.parse() {
        Ok(repo) => repo,
        Err(e) => return cli::report_failure(&reporter, &e).await,
    };

    let options = cli::RunArgs {
        fork: args.fork,
        dry_run: args.test,
        config: args.config,
        host: args.host,
        manifest: args.manifest,
    };

    match cli::run_reconcile(repo, options, &reporter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => cli::report_failure(&reporter, &e).await,
    }
}
