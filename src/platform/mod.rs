//! Platform services for GitHub
//!
//! The reconciliation engine only talks to the hosting platform through
//! [`RemoteRepository`], so tests can substitute an in-memory double.

mod github;

pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    Actor, Branch, CommitPointer, FileContent, Fork, Issue, NewPullRequest, PullRequest, RepoId,
    RepositoryInfo,
};
use async_trait::async_trait;

/// Remote repository operations used by a run
///
/// Every method names the repository it acts on. Missing resources are
/// reported as [`Error::NotFound`](crate::error::Error::NotFound) and refused
/// writes as [`Error::PermissionDenied`](crate::error::Error::PermissionDenied),
/// so callers can tell them apart from transport failures.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Fetch repository metadata
    async fn get_repository(&self, repo: &RepoId) -> Result<RepositoryInfo>;

    /// Identity of the authenticated user
    async fn current_user(&self) -> Result<Actor>;

    /// Open pull requests authored by `author` against `repo`
    ///
    /// Search results only carry summary fields; `head_ref` may be empty.
    async fn search_open_pull_requests(
        &self,
        repo: &RepoId,
        author: &str,
    ) -> Result<Vec<PullRequest>>;

    /// Fetch a single pull request with its head and base refs
    async fn get_pull_request(&self, repo: &RepoId, number: u64) -> Result<PullRequest>;

    /// Fetch a branch by name
    async fn get_branch(&self, repo: &RepoId, branch: &str) -> Result<Branch>;

    /// Create `branch` pointing at `tip`
    async fn create_branch(&self, repo: &RepoId, branch: &str, tip: &CommitPointer)
    -> Result<()>;

    /// List forks of `repo`
    async fn list_forks(&self, repo: &RepoId) -> Result<Vec<Fork>>;

    /// Request a fork of `repo` under the authenticated user
    async fn create_fork(&self, repo: &RepoId) -> Result<Fork>;

    /// Open an issue
    async fn create_issue(&self, repo: &RepoId, title: &str, body: &str) -> Result<Issue>;

    /// Open a pull request against `repo`
    async fn create_pull_request(&self, repo: &RepoId, pr: &NewPullRequest)
    -> Result<PullRequest>;

    /// Set the repository description, returning the stored value
    async fn update_description(&self, repo: &RepoId, description: &str) -> Result<String>;

    /// Replace all repository topics, returning the stored list
    async fn replace_topics(&self, repo: &RepoId, topics: &[String]) -> Result<Vec<String>>;

    /// Read a file from a branch
    async fn get_file(&self, repo: &RepoId, path: &str, branch: &str) -> Result<FileContent>;

    /// Commit new contents of an existing file to a branch
    async fn update_file(
        &self,
        repo: &RepoId,
        path: &str,
        branch: &str,
        message: &str,
        contents: &str,
        sha: &str,
    ) -> Result<()>;
}
