//! Error types for manifest-sync

use thiserror::Error;

/// Errors produced while reconciling a repository
#[derive(Error, Debug)]
pub enum Error {
    /// Remote resource is absent (404). Usually a control-flow signal, not a failure.
    #[error("not found: {0}")]
    NotFound(String),

    /// Remote write refused (401/403)
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The canonical repository could not be fetched
    #[error("{0} is not a valid GitHub repository")]
    RepositoryNotFound(String),

    /// More than one open pull request authored by the bot
    #[error("found {} open pull requests ({}), refusing to guess which one to update", .0.len(), format_numbers(.0))]
    AmbiguousProposals(Vec<u64>),

    /// Existing pull request head branch was not created by this tool
    #[error("existing branch '{0}' doesn't look like it was made by this tool")]
    ForeignBranch(String),

    /// Integration branch could not be created
    #[error("unable to create branch '{branch}': {reason}")]
    BranchCreation {
        /// Branch that was being created
        branch: String,
        /// Underlying failure
        reason: String,
    },

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Generic platform error (used by test doubles and non-HTTP failures)
    #[error("platform error: {0}")]
    Platform(String),

    /// Authentication error
    #[error("authentication error: {0}")]
    Auth(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Manifest could not be read or written
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Invalid repository slug
    #[error("invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit status for a run that ended with this error
    pub const fn exit_code(&self) -> i32 {
        1
    }

    /// Whether this is the "resource absent" signal
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the run already told the user about this failure
    ///
    /// The engine fires its own message before returning these, so the
    /// front end shouldn't print them a second time.
    pub const fn already_reported(&self) -> bool {
        matches!(
            self,
            Self::RepositoryNotFound(_)
                | Self::ForeignBranch(_)
                | Self::AmbiguousProposals(_)
                | Self::BranchCreation { .. }
        )
    }
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        if let octocrab::Error::GitHub { source, .. } = &err {
            match source.status_code.as_u16() {
                404 => return Self::NotFound(source.message.clone()),
                401 | 403 => return Self::PermissionDenied(source.message.clone()),
                _ => {}
            }
        }
        Self::GitHubApi(err.to_string())
    }
}

fn format_numbers(numbers: &[u64]) -> String {
    numbers
        .iter()
        .map(|n| format!("#{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for manifest-sync
pub type Result<T> = std::result::Result<T, Error>;

/// Classified outcome of a single remote operation
///
/// Components match on this instead of inspecting errors inline, so the
/// "expected absence", "refused" and "broken" cases stay distinct.
#[derive(Debug)]
pub enum RemoteOutcome<T> {
    /// Operation succeeded
    Success(T),
    /// Resource does not exist
    NotFound,
    /// Remote refused the operation
    PermissionDenied(String),
    /// Any other failure
    Failed(Error),
}

impl<T> RemoteOutcome<T> {
    /// Classify a remote result
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) if err.is_not_found() => Self::NotFound,
            Err(Error::PermissionDenied(msg)) => Self::PermissionDenied(msg),
            Err(err) => Self::Failed(err),
        }
    }

    /// Convert "not found" into `None`, keeping every other failure an error
    pub fn found(self) -> Result<Option<T>> {
        match self {
            Self::Success(value) => Ok(Some(value)),
            Self::NotFound => Ok(None),
            Self::PermissionDenied(msg) => Err(Error::PermissionDenied(msg)),
            Self::Failed(err) => Err(err),
        }
    }
}
