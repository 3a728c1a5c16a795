//! Shared setup for a run
//!
//! Loads configuration, resolves credentials and creates the platform service.

use manifest_sync::auth::get_github_auth;
use manifest_sync::config::{Config, default_config_path, load_config};
use manifest_sync::error::Result;
use manifest_sync::platform::GitHubService;
use std::path::Path;
use tracing::debug;

/// Everything a run needs before talking to GitHub
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// GitHub client
    pub platform: GitHubService,
}

impl CommandContext {
    /// Create a new command context
    ///
    /// - Load config (explicit path, else the default location)
    /// - Resolve the GitHub token
    /// - Create the GitHub service, with `host` overriding the config
    pub async fn new(config_path: Option<&Path>, host: Option<&str>) -> Result<Self> {
        let config = match config_path {
            Some(path) => load_config(path)?,
            None => default_config_path()
                .map(|path| load_config(&path))
                .transpose()?
                .unwrap_or_default(),
        };

        let auth = get_github_auth().await?;
        debug!(source = ?auth.source, "resolved GitHub token");

        let host = host.or(config.host.as_deref());
        let platform = GitHubService::new(&auth.token, host)?;

        Ok(Self { config, platform })
    }
}
