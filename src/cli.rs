//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Values left unset fall back to the
//! configuration file, then to built-in defaults.

use crate::analysis::{ScoreMethod, SortOrder};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// follower-rank - rank a GitHub user's followers
///
/// Ranks followers by follower count, following count, account age,
/// public repositories, public gists, or follower/following ratio.
///
/// Examples:
///   follower-rank --username octocat
///   follower-rank --username octocat --method ffratio --top 20
///   follower-rank --token $GITHUB_TOKEN --method created --format json -o ranking.json
///   follower-rank --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// GitHub username whose followers to rank
    ///
    /// When omitted, the followers of the account owning the token are ranked.
    #[arg(short, long, value_name = "USER")]
    pub username: Option<String>,

    /// GitHub access token
    ///
    /// Raises the API rate limit. Required when no username is given.
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Ranking method
    ///
    /// Values: followers, following, created, repos, gists, ffratio.
    /// For `created`, `desc` lists the oldest accounts first.
    #[arg(short, long, value_name = "METHOD")]
    pub method: Option<ScoreMethod>,

    /// Sort order (asc, desc)
    #[arg(long, value_name = "ORDER")]
    pub order: Option<SortOrder>,

    /// User agent sent to the GitHub API
    #[arg(long, value_name = "STRING")]
    pub user_agent: Option<String>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path for the report (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only list the first COUNT followers in the Markdown table
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// GitHub API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of follower detail requests in flight
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .follower-rank.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .follower-rank.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref api_url) = self.api_url {
            if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.top == Some(0) {
            return Err("Top must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
