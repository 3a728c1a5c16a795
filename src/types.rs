//! Core types for manifest-sync

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Characters GitHub allows in owner and repository names
static NAME_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("name pattern compiles"));

/// Owner/name pair identifying a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoId {
    /// Create a repository id
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Same repository name under a different owner (where a fork lives)
    pub fn with_owner(&self, owner: &str) -> Self {
        Self::new(owner, self.name.clone())
    }

    /// Web URL of the repository under `web_base` (e.g. `https://github.com`)
    pub fn web_url(&self, web_base: &str) -> String {
        format!("{}/{self}", web_base.trim_end_matches('/'))
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    /// Parse `owner/name`, also accepting a full `https://github.com/owner/name` URL
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let slug = match url::Url::parse(trimmed) {
            Ok(url) if url.has_host() => url.path().to_string(),
            _ => trimmed.to_string(),
        };
        let slug = slug.trim_matches('/');
        let slug = slug.strip_suffix(".git").unwrap_or(slug);

        match slug.split_once('/') {
            Some((owner, name))
                if NAME_SEGMENT.is_match(owner) && NAME_SEGMENT.is_match(name) =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(Error::InvalidRepository(s.to_string())),
        }
    }
}

/// Authenticated bot identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Login name
    pub login: String,
}

/// The repository that receives writes during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingTarget {
    /// Writes go straight to the canonical repository
    Canonical(RepoId),
    /// Writes go to a fork owned by the bot
    Fork(RepoId),
}

impl WorkingTarget {
    /// Repository receiving writes
    pub const fn repo(&self) -> &RepoId {
        match self {
            Self::Canonical(repo) | Self::Fork(repo) => repo,
        }
    }

    /// Owner used in the `owner:branch` head reference
    pub fn owner(&self) -> &str {
        &self.repo().owner
    }
}

impl fmt::Display for WorkingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.repo().fmt(f)
    }
}

/// Opaque commit hash, compared only for equality
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitPointer(pub String);

impl CommitPointer {
    /// Abbreviated form for log lines
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl fmt::Display for CommitPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Repository metadata as reported by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Repository description
    pub description: Option<String>,
    /// Repository topics
    pub topics: Vec<String>,
    /// SPDX id of the detected license
    pub license_spdx: Option<String>,
    /// Default branch name
    pub default_branch: Option<String>,
}

/// A branch and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Branch name
    pub name: String,
    /// Tip commit
    pub tip: CommitPointer,
}

/// A fork of a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fork {
    /// Full id of the fork
    pub repo: RepoId,
}

/// A pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Head branch name (empty when only the search summary is known)
    pub head_ref: String,
    /// Base branch name
    pub base_ref: String,
    /// PR title
    pub title: String,
}

/// An issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Issue number
    pub number: u64,
    /// Web URL for the issue
    pub html_url: String,
}

/// Parameters for opening a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    /// Title
    pub title: String,
    /// Head reference, `owner:branch`
    pub head: String,
    /// Base branch
    pub base: String,
    /// Body
    pub body: String,
}

/// A file read from a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    /// Decoded file text
    pub text: String,
    /// Blob sha, required when updating the file
    pub sha: String,
}

/// Ordered, append-only collection of notes for the pull request body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteLog {
    notes: Vec<String>,
}

impl NoteLog {
    /// Empty log
    pub const fn new() -> Self {
        Self { notes: Vec::new() }
    }

    /// Append a single note
    pub fn push(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Append all notes from a checker, keeping their order
    pub fn extend<I, S>(&mut self, notes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.notes.extend(notes.into_iter().map(Into::into));
    }

    /// Notes in insertion order
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Number of notes
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Whether no notes were recorded
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
