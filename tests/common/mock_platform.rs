//! Mock platform service for testing
//!
//! Keeps an in-memory picture of GitHub (repositories, branches, files,
//! forks, open pull requests) so that whole runs can be replayed, including
//! a second run against the state the first one left behind.

#![allow(dead_code)]

use async_trait::async_trait;
use manifest_sync::error::{Error, Result};
use manifest_sync::platform::RemoteRepository;
use manifest_sync::types::{
    Actor, Branch, CommitPointer, FileContent, Fork, Issue, NewPullRequest, PullRequest, RepoId,
    RepositoryInfo,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Failure to inject into a mock operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injected {
    /// 404
    NotFound,
    /// 401/403
    Denied(String),
    /// Anything else
    Broken(String),
}

impl Injected {
    fn to_error(&self, what: &str) -> Error {
        match self {
            Self::NotFound => Error::NotFound(what.to_string()),
            Self::Denied(msg) => Error::PermissionDenied(msg.clone()),
            Self::Broken(msg) => Error::Platform(msg.clone()),
        }
    }
}

/// Call record for `create_branch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBranchCall {
    pub repo: RepoId,
    pub branch: String,
    pub sha: String,
}

/// Call record for `create_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub repo: RepoId,
    pub pr: NewPullRequest,
}

/// Call record for `create_issue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIssueCall {
    pub repo: RepoId,
    pub title: String,
    pub body: String,
}

/// Call record for `update_file`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFileCall {
    pub repo: RepoId,
    pub path: String,
    pub branch: String,
    pub contents: String,
}

#[derive(Default)]
struct RemoteState {
    repositories: HashMap<RepoId, RepositoryInfo>,
    branches: HashMap<(RepoId, String), CommitPointer>,
    files: HashMap<(RepoId, String, String), FileContent>,
    forks: HashMap<RepoId, Vec<Fork>>,
    open_prs: Vec<(RepoId, PullRequest)>,
}

/// In-memory GitHub for testing
///
/// Features:
/// - Stateful branches, files, forks and pull requests
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    actor: String,
    state: Mutex<RemoteState>,
    next_number: AtomicU64,
    next_commit: AtomicU64,
    // Call tracking
    get_branch_calls: Mutex<Vec<(RepoId, String)>>,
    create_branch_calls: Mutex<Vec<CreateBranchCall>>,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    create_issue_calls: Mutex<Vec<CreateIssueCall>>,
    create_fork_calls: Mutex<Vec<RepoId>>,
    list_fork_calls: Mutex<Vec<RepoId>>,
    update_file_calls: Mutex<Vec<UpdateFileCall>>,
    description_calls: Mutex<Vec<(RepoId, String)>>,
    topics_calls: Mutex<Vec<(RepoId, Vec<String>)>>,
    // Error injection
    error_on_create_branch: Mutex<Option<Injected>>,
    error_on_create_fork: Mutex<Option<Injected>>,
    error_on_create_pr: Mutex<Option<Injected>>,
    error_on_create_issue: Mutex<Option<Injected>>,
    error_on_update_description: Mutex<Option<Injected>>,
    error_on_replace_topics: Mutex<Option<Injected>>,
    error_on_get_branch: Mutex<Option<Injected>>,
}

impl MockPlatformService {
    /// Create an empty remote where `actor` is the authenticated user
    pub fn new(actor: &str) -> Self {
        Self {
            actor: actor.to_string(),
            state: Mutex::new(RemoteState::default()),
            next_number: AtomicU64::new(100),
            next_commit: AtomicU64::new(1),
            get_branch_calls: Mutex::new(Vec::new()),
            create_branch_calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            create_issue_calls: Mutex::new(Vec::new()),
            create_fork_calls: Mutex::new(Vec::new()),
            list_fork_calls: Mutex::new(Vec::new()),
            update_file_calls: Mutex::new(Vec::new()),
            description_calls: Mutex::new(Vec::new()),
            topics_calls: Mutex::new(Vec::new()),
            error_on_create_branch: Mutex::new(None),
            error_on_create_fork: Mutex::new(None),
            error_on_create_pr: Mutex::new(None),
            error_on_create_issue: Mutex::new(None),
            error_on_update_description: Mutex::new(None),
            error_on_replace_topics: Mutex::new(None),
            error_on_get_branch: Mutex::new(None),
        }
    }

    fn new_commit(&self) -> CommitPointer {
        let n = self.next_commit.fetch_add(1, Ordering::SeqCst);
        CommitPointer(format!("{n:040x}"))
    }

    // === Setup methods ===

    /// Register a repository whose default branch points at `tip`
    pub fn add_repository(&self, repo: &RepoId, info: RepositoryInfo, tip: &str) {
        let default_branch = info
            .default_branch
            .clone()
            .unwrap_or_else(|| "master".to_string());
        let mut state = self.state.lock().unwrap();
        state.repositories.insert(repo.clone(), info);
        state
            .branches
            .insert((repo.clone(), default_branch), CommitPointer(tip.to_string()));
    }

    /// Point `branch` of `repo` at `sha`
    pub fn set_branch(&self, repo: &RepoId, branch: &str, sha: &str) {
        self.state
            .lock()
            .unwrap()
            .branches
            .insert((repo.clone(), branch.to_string()), CommitPointer(sha.to_string()));
    }

    /// Put a file on a branch
    pub fn add_file(&self, repo: &RepoId, branch: &str, path: &str, text: &str) {
        let sha = format!("blob-{}", self.next_commit.fetch_add(1, Ordering::SeqCst));
        self.state.lock().unwrap().files.insert(
            (repo.clone(), branch.to_string(), path.to_string()),
            FileContent {
                text: text.to_string(),
                sha,
            },
        );
    }

    /// Register an open pull request authored by the actor
    pub fn add_open_pr(&self, repo: &RepoId, number: u64, head: &str) {
        self.state.lock().unwrap().open_prs.push((
            repo.clone(),
            PullRequest {
                number,
                html_url: format!("https://github.com/{repo}/pull/{number}"),
                head_ref: head.to_string(),
                base_ref: "main".to_string(),
                title: "Update package.json metadata".to_string(),
            },
        ));
    }

    /// Register a fork of `repo` owned by `owner`
    pub fn add_fork(&self, repo: &RepoId, owner: &str) {
        self.add_fork_named(repo, owner, &repo.name);
    }

    /// Register a fork of `repo` owned by `owner` under a different name
    pub fn add_fork_named(&self, repo: &RepoId, owner: &str, name: &str) {
        let fork = RepoId::new(owner, name);
        let mut state = self.state.lock().unwrap();
        let info = state.repositories.get(repo).cloned().unwrap_or_default();
        state.repositories.insert(fork.clone(), info);
        state
            .forks
            .entry(repo.clone())
            .or_default()
            .push(Fork { repo: fork });
    }

    // === Error injection methods ===

    pub fn fail_create_branch(&self, failure: Injected) {
        *self.error_on_create_branch.lock().unwrap() = Some(failure);
    }

    pub fn fail_create_fork(&self, failure: Injected) {
        *self.error_on_create_fork.lock().unwrap() = Some(failure);
    }

    pub fn fail_create_pr(&self, failure: Injected) {
        *self.error_on_create_pr.lock().unwrap() = Some(failure);
    }

    pub fn fail_create_issue(&self, failure: Injected) {
        *self.error_on_create_issue.lock().unwrap() = Some(failure);
    }

    pub fn fail_update_description(&self, failure: Injected) {
        *self.error_on_update_description.lock().unwrap() = Some(failure);
    }

    pub fn fail_replace_topics(&self, failure: Injected) {
        *self.error_on_replace_topics.lock().unwrap() = Some(failure);
    }

    pub fn fail_get_branch(&self, failure: Injected) {
        *self.error_on_get_branch.lock().unwrap() = Some(failure);
    }

    // === State inspection ===

    /// Current tip of a branch
    pub fn branch_tip(&self, repo: &RepoId, branch: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .branches
            .get(&(repo.clone(), branch.to_string()))
            .map(|c| c.0.clone())
    }

    /// Current contents of a file
    pub fn file_text(&self, repo: &RepoId, branch: &str, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(&(repo.clone(), branch.to_string(), path.to_string()))
            .map(|f| f.text.clone())
    }

    /// Repository metadata as currently stored
    pub fn repository(&self, repo: &RepoId) -> Option<RepositoryInfo> {
        self.state.lock().unwrap().repositories.get(repo).cloned()
    }

    /// Open pull requests on `repo`
    pub fn open_prs(&self, repo: &RepoId) -> Vec<PullRequest> {
        self.state
            .lock()
            .unwrap()
            .open_prs
            .iter()
            .filter(|(r, _)| r == repo)
            .map(|(_, pr)| pr.clone())
            .collect()
    }

    // === Call verification methods ===

    pub fn get_branch_calls(&self) -> Vec<(RepoId, String)> {
        self.get_branch_calls.lock().unwrap().clone()
    }

    pub fn get_create_branch_calls(&self) -> Vec<CreateBranchCall> {
        self.create_branch_calls.lock().unwrap().clone()
    }

    pub fn get_create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    pub fn get_create_issue_calls(&self) -> Vec<CreateIssueCall> {
        self.create_issue_calls.lock().unwrap().clone()
    }

    pub fn get_create_fork_calls(&self) -> Vec<RepoId> {
        self.create_fork_calls.lock().unwrap().clone()
    }

    pub fn get_list_fork_calls(&self) -> Vec<RepoId> {
        self.list_fork_calls.lock().unwrap().clone()
    }

    pub fn get_update_file_calls(&self) -> Vec<UpdateFileCall> {
        self.update_file_calls.lock().unwrap().clone()
    }

    pub fn get_description_calls(&self) -> Vec<(RepoId, String)> {
        self.description_calls.lock().unwrap().clone()
    }

    pub fn get_topics_calls(&self) -> Vec<(RepoId, Vec<String>)> {
        self.topics_calls.lock().unwrap().clone()
    }

    /// Number of calls that would have changed remote state
    pub fn mutation_count(&self) -> usize {
        self.create_branch_calls.lock().unwrap().len()
            + self.create_pr_calls.lock().unwrap().len()
            + self.create_issue_calls.lock().unwrap().len()
            + self.create_fork_calls.lock().unwrap().len()
            + self.update_file_calls.lock().unwrap().len()
            + self.description_calls.lock().unwrap().len()
            + self.topics_calls.lock().unwrap().len()
    }

    /// Assert that `create_pr` was called with specific head and base
    pub fn assert_create_pr_called(&self, head: &str, base: &str) {
        let calls = self.get_create_pr_calls();
        assert!(
            calls.iter().any(|c| c.pr.head == head && c.pr.base == base),
            "Expected create_pull_request({head}, {base}) but got: {calls:?}"
        );
    }
}

#[async_trait]
impl RemoteRepository for MockPlatformService {
    async fn get_repository(&self, repo: &RepoId) -> Result<RepositoryInfo> {
        self.repository(repo)
            .ok_or_else(|| Error::NotFound(format!("repository {repo}")))
    }

    async fn current_user(&self) -> Result<Actor> {
        Ok(Actor {
            login: self.actor.clone(),
        })
    }

    async fn search_open_pull_requests(
        &self,
        repo: &RepoId,
        _author: &str,
    ) -> Result<Vec<PullRequest>> {
        Ok(self
            .open_prs(repo)
            .into_iter()
            .map(|pr| PullRequest {
                head_ref: String::new(),
                base_ref: String::new(),
                ..pr
            })
            .collect())
    }

    async fn get_pull_request(&self, repo: &RepoId, number: u64) -> Result<PullRequest> {
        self.open_prs(repo)
            .into_iter()
            .find(|pr| pr.number == number)
            .ok_or_else(|| Error::NotFound(format!("pull request #{number}")))
    }

    async fn get_branch(&self, repo: &RepoId, branch: &str) -> Result<Branch> {
        self.get_branch_calls
            .lock()
            .unwrap()
            .push((repo.clone(), branch.to_string()));

        if let Some(failure) = self.error_on_get_branch.lock().unwrap().as_ref() {
            return Err(failure.to_error(branch));
        }

        self.branch_tip(repo, branch)
            .map(|sha| Branch {
                name: branch.to_string(),
                tip: CommitPointer(sha),
            })
            .ok_or_else(|| Error::NotFound(format!("branch {branch}")))
    }

    async fn create_branch(
        &self,
        repo: &RepoId,
        branch: &str,
        tip: &CommitPointer,
    ) -> Result<()> {
        self.create_branch_calls
            .lock()
            .unwrap()
            .push(CreateBranchCall {
                repo: repo.clone(),
                branch: branch.to_string(),
                sha: tip.0.clone(),
            });

        if let Some(failure) = self.error_on_create_branch.lock().unwrap().as_ref() {
            return Err(failure.to_error(branch));
        }

        let mut state = self.state.lock().unwrap();
        if !state.repositories.contains_key(repo) {
            return Err(Error::NotFound(format!("repository {repo}")));
        }
        if state
            .branches
            .contains_key(&(repo.clone(), branch.to_string()))
        {
            return Err(Error::Platform("Reference already exists".to_string()));
        }

        // New branch starts with the files of whichever branch had this tip
        let source = state
            .branches
            .iter()
            .find(|(_, sha)| *sha == tip)
            .map(|((r, b), _)| (r.clone(), b.clone()));
        if let Some((source_repo, source_branch)) = source {
            let copied: Vec<_> = state
                .files
                .iter()
                .filter(|((r, b, _), _)| *r == source_repo && *b == source_branch)
                .map(|((_, _, path), file)| {
                    ((repo.clone(), branch.to_string(), path.clone()), file.clone())
                })
                .collect();
            state.files.extend(copied);
        }

        state
            .branches
            .insert((repo.clone(), branch.to_string()), tip.clone());
        Ok(())
    }

    async fn list_forks(&self, repo: &RepoId) -> Result<Vec<Fork>> {
        self.list_fork_calls.lock().unwrap().push(repo.clone());
        Ok(self
            .state
            .lock()
            .unwrap()
            .forks
            .get(repo)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_fork(&self, repo: &RepoId) -> Result<Fork> {
        self.create_fork_calls.lock().unwrap().push(repo.clone());

        if let Some(failure) = self.error_on_create_fork.lock().unwrap().as_ref() {
            return Err(failure.to_error("fork"));
        }

        self.add_fork(repo, &self.actor);
        Ok(Fork {
            repo: repo.with_owner(&self.actor),
        })
    }

    async fn create_issue(&self, repo: &RepoId, title: &str, body: &str) -> Result<Issue> {
        self.create_issue_calls
            .lock()
            .unwrap()
            .push(CreateIssueCall {
                repo: repo.clone(),
                title: title.to_string(),
                body: body.to_string(),
            });

        if let Some(failure) = self.error_on_create_issue.lock().unwrap().as_ref() {
            return Err(failure.to_error("issue"));
        }

        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        Ok(Issue {
            number,
            html_url: format!("https://github.com/{repo}/issues/{number}"),
        })
    }

    async fn create_pull_request(
        &self,
        repo: &RepoId,
        pr: &NewPullRequest,
    ) -> Result<PullRequest> {
        self.create_pr_calls.lock().unwrap().push(CreatePrCall {
            repo: repo.clone(),
            pr: pr.clone(),
        });

        if let Some(failure) = self.error_on_create_pr.lock().unwrap().as_ref() {
            return Err(failure.to_error("pull request"));
        }

        let head_ref = pr
            .head
            .split_once(':')
            .map_or(pr.head.as_str(), |(_, branch)| branch)
            .to_string();
        if self.open_prs(repo).iter().any(|open| open.head_ref == head_ref) {
            return Err(Error::Platform(
                "A pull request already exists for this head".to_string(),
            ));
        }

        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        let created = PullRequest {
            number,
            html_url: format!("https://github.com/{repo}/pull/{number}"),
            head_ref,
            base_ref: pr.base.clone(),
            title: pr.title.clone(),
        };
        self.state
            .lock()
            .unwrap()
            .open_prs
            .push((repo.clone(), created.clone()));
        Ok(created)
    }

    async fn update_description(&self, repo: &RepoId, description: &str) -> Result<String> {
        self.description_calls
            .lock()
            .unwrap()
            .push((repo.clone(), description.to_string()));

        if let Some(failure) = self.error_on_update_description.lock().unwrap().as_ref() {
            return Err(failure.to_error("description"));
        }

        let mut state = self.state.lock().unwrap();
        let info = state
            .repositories
            .get_mut(repo)
            .ok_or_else(|| Error::NotFound(format!("repository {repo}")))?;
        info.description = Some(description.to_string());
        Ok(description.to_string())
    }

    async fn replace_topics(&self, repo: &RepoId, topics: &[String]) -> Result<Vec<String>> {
        self.topics_calls
            .lock()
            .unwrap()
            .push((repo.clone(), topics.to_vec()));

        if let Some(failure) = self.error_on_replace_topics.lock().unwrap().as_ref() {
            return Err(failure.to_error("topics"));
        }

        let mut state = self.state.lock().unwrap();
        let info = state
            .repositories
            .get_mut(repo)
            .ok_or_else(|| Error::NotFound(format!("repository {repo}")))?;
        info.topics = topics.to_vec();
        Ok(topics.to_vec())
    }

    async fn get_file(&self, repo: &RepoId, path: &str, branch: &str) -> Result<FileContent> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(&(repo.clone(), branch.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn update_file(
        &self,
        repo: &RepoId,
        path: &str,
        branch: &str,
        _message: &str,
        contents: &str,
        sha: &str,
    ) -> Result<()> {
        self.update_file_calls.lock().unwrap().push(UpdateFileCall {
            repo: repo.clone(),
            path: path.to_string(),
            branch: branch.to_string(),
            contents: contents.to_string(),
        });

        let commit = self.new_commit();
        let mut state = self.state.lock().unwrap();
        let key = (repo.clone(), branch.to_string(), path.to_string());
        match state.files.get(&key) {
            Some(current) if current.sha == sha => {}
            _ => return Err(Error::Platform(format!("{path} does not match {sha}"))),
        }
        if !state
            .branches
            .contains_key(&(repo.clone(), branch.to_string()))
        {
            return Err(Error::NotFound(format!("branch {branch}")));
        }

        state.files.insert(
            key,
            FileContent {
                text: contents.to_string(),
                sha: format!("blob-{}", commit.0),
            },
        );
        state
            .branches
            .insert((repo.clone(), branch.to_string()), commit);
        Ok(())
    }
}
