//! Run narration
//!
//! Everything the user should read about a run goes through [`Reporter`],
//! which keeps the engine free of terminal concerns and lets tests assert
//! on what would have been printed.

use async_trait::async_trait;

/// Receiver for user-facing run messages
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Normal progress message
    async fn info(&self, message: &str);

    /// Something went wrong but the run continues
    async fn warn(&self, message: &str);

    /// Something the user must act on (refusals, fatal conditions)
    async fn fire(&self, message: &str);
}

/// Reporter that discards everything
pub struct NoopReporter;

#[async_trait]
impl Reporter for NoopReporter {
    async fn info(&self, _message: &str) {}
    async fn warn(&self, _message: &str) {}
    async fn fire(&self, _message: &str) {}
}
