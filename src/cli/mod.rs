//! Command-line front end

mod context;
mod run;
mod style;

pub use run::{RunArgs, run_reconcile};

use anstream::{eprintln, println};
use async_trait::async_trait;
use manifest_sync::error::Error;
use manifest_sync::reconcile::Reporter;
use std::process::ExitCode;
use style::{ROBOT, Stylize};
use tracing::debug;

/// Reporter printing robot narration to the terminal
pub struct CliReporter;

#[async_trait]
impl Reporter for CliReporter {
    async fn info(&self, message: &str) {
        println!("{ROBOT} {message}");
    }

    async fn warn(&self, message: &str) {
        println!("{ROBOT} {}", message.warn());
    }

    async fn fire(&self, message: &str) {
        eprintln!("{ROBOT}🔥 {}", message.error());
    }
}

/// Print a fatal error and turn it into the process exit status
///
/// Errors the run already narrated only go to the debug log.
pub async fn report_failure(reporter: &CliReporter, err: &Error) -> ExitCode {
    if err.already_reported() {
        debug!(error = %err, "run ended");
    } else {
        reporter.fire(&err.to_string()).await;
    }
    u8::try_from(err.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}
