//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.follower-rank.toml` files.

use crate::analysis::{ScoreMethod, SortOrder};
use crate::cli::OutputFormat;
use crate::pipeline::DEFAULT_USER_AGENT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".follower-rank.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Ranking settings.
    #[serde(default)]
    pub rank: RankConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Detail lookups kept in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Followers requested per page (at most 100).
    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// Show a progress bar while fetching details.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            concurrency: default_concurrency(),
            per_page: default_per_page(),
            show_progress: true,
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_concurrency() -> usize {
    8
}

fn default_per_page() -> usize {
    100
}

fn default_true() -> bool {
    true
}

/// Ranking settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankConfig {
    /// Whose followers to rank when no username is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Ranking method.
    #[serde(default)]
    pub method: ScoreMethod,

    /// Sort order.
    #[serde(default)]
    pub order: SortOrder,
}

/// Report settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Maximum rows in the Markdown table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load the configuration file inside `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given on the command line (or through their environment
    /// variables) override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref username) = args.username {
            self.rank.username = Some(username.clone());
        }
        if let Some(method) = args.method {
            self.rank.method = method;
        }
        if let Some(order) = args.order {
            self.rank.order = order;
        }

        if let Some(ref user_agent) = args.user_agent {
            self.github.user_agent = user_agent.clone();
        }
        if let Some(ref api_url) = args.api_url {
            self.github.api_url = api_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.github.timeout_seconds = timeout;
        }
        if let Some(concurrency) = args.concurrency {
            self.github.concurrency = concurrency;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(top) = args.top {
            self.report.top = Some(top);
        }

        // Progress bars would interleave with quiet output
        if args.quiet {
            self.github.show_progress = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
