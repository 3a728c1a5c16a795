//! Run configuration
//!
//! Settings come from `<config_dir>/manifest-sync/config.toml` and are then
//! overridden by command-line flags.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the platform config dir
const CONFIG_DIR: &str = "manifest-sync";

/// Filename for the config file
const CONFIG_FILE: &str = "config.toml";

/// Manifest checked when nothing else is configured
pub const DEFAULT_MANIFEST: &str = "package.json";

/// Web base for repositories on github.com
pub const DEFAULT_WEB_BASE: &str = "https://github.com";

/// Web base for repositories on `host`, or github.com without one
pub fn web_base(host: Option<&str>) -> String {
    host.map_or_else(|| DEFAULT_WEB_BASE.to_string(), |h| format!("https://{h}"))
}

/// Persistent settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub Enterprise host (None for github.com)
    pub host: Option<String>,
    /// Work on a fork owned by the bot instead of the canonical repository
    pub fork: bool,
    /// Manifest path inside the repository
    pub manifest: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            fork: false,
            manifest: DEFAULT_MANIFEST.to_string(),
        }
    }
}

/// Options that shape a single reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Operate on a fork rather than the canonical repository
    pub fork: bool,
    /// Dry run: report instead of performing remote mutations
    pub dry_run: bool,
    /// Manifest path inside the repository
    pub manifest_path: String,
    /// Web base the repository URLs in the manifest are expected to use
    pub web_base: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            fork: false,
            dry_run: false,
            manifest_path: DEFAULT_MANIFEST.to_string(),
            web_base: DEFAULT_WEB_BASE.to_string(),
        }
    }
}

impl Config {
    /// Build run options, letting explicit flags win over file settings
    pub fn run_options(
        &self,
        fork: bool,
        dry_run: bool,
        manifest: Option<&str>,
        host: Option<&str>,
    ) -> RunOptions {
        RunOptions {
            fork: fork || self.fork,
            dry_run,
            manifest_path: manifest.unwrap_or(&self.manifest).to_string(),
            web_base: web_base(host.or(self.host.as_deref())),
        }
    }
}

/// Default config file location, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration from `path`.
///
/// Returns defaults if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}
