//! Content checkers
//!
//! A checker inspects the working target, may commit fixes to the
//! integration branch, and returns notes for the pull request body.

mod manifest;

pub use manifest::{LintReport, ManifestChecker, MetadataFix, lint_manifest};

use crate::config::RunOptions;
use crate::error::Result;
use crate::platform::RemoteRepository;
use crate::reconcile::Reporter;
use crate::types::{RepoId, RepositoryInfo, WorkingTarget};
use async_trait::async_trait;

/// Everything a checker may look at during a run
pub struct CheckContext<'a> {
    /// Remote client
    pub platform: &'a dyn RemoteRepository,
    /// Run narration
    pub reporter: &'a dyn Reporter,
    /// Canonical repository
    pub canonical: &'a RepoId,
    /// Canonical repository metadata
    pub info: &'a RepositoryInfo,
    /// Canonical default branch
    pub default_branch: &'a str,
    /// Repository receiving writes
    pub target: &'a WorkingTarget,
    /// Integration branch
    pub branch: &'a str,
    /// Whether the integration branch exists (false only in dry run)
    pub branch_exists: bool,
    /// Run options
    pub options: &'a RunOptions,
}

impl CheckContext<'_> {
    /// Repository and branch to read current contents from
    ///
    /// Falls back to the canonical default branch when the integration
    /// branch was never created.
    pub fn read_location(&self) -> (&RepoId, &str) {
        if self.branch_exists {
            (self.target.repo(), self.branch)
        } else {
            (self.canonical, self.default_branch)
        }
    }
}

/// A content check contributing notes to the pull request
#[async_trait]
pub trait Checker: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Run the check, returning notes in the order they should appear
    async fn check(&self, ctx: &CheckContext<'_>) -> Result<Vec<String>>;
}
