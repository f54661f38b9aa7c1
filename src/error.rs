//! Error types for follower ranking.
//!
//! Configuration problems are rejected before any network activity.
//! Upstream failures are carried as `FetchError` and handed to the caller
//! unchanged, together with the latest rate limit info.

use thiserror::Error;

/// Status used when a detail lookup reports partial failure.
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Invalid options detected while constructing a ranker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither a username nor an access token was supplied.
    #[error(
        "invalid input argument. Must provide a username or, to rank an authenticated user's followers, an access token."
    )]
    MissingIdentity,

    /// The score method name is not one of the supported methods.
    #[error(
        "invalid method `{0}`. Must be one of: followers, following, created, repos, gists, ffratio."
    )]
    InvalidMethod(String),

    /// The sort order is neither `asc` nor `desc`.
    #[error("invalid order `{0}`. Must be either `asc` or `desc`.")]
    InvalidOrder(String),

    /// The user agent string is empty.
    #[error("invalid input argument. User agent must be a non-empty string.")]
    EmptyUserAgent,
}

/// An error reported by one of the fetch collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{status}] {message}")]
pub struct FetchError {
    /// HTTP-style status code.
    pub status: u16,
    /// Human readable message.
    pub message: String,
}

impl FetchError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// A throttling error (429), used when only part of the details came back.
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(STATUS_TOO_MANY_REQUESTS, message)
    }

    /// Whether this error signals an exhausted or throttled quota.
    pub fn is_rate_limited(&self) -> bool {
        self.status == STATUS_TOO_MANY_REQUESTS
    }
}

/// Any error surfaced by the ranking entry points.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl RankError {
    /// A suggestion for the user, when the error has an obvious remedy.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            RankError::Config(ConfigError::MissingIdentity) => {
                Some("Pass a username, or set GITHUB_TOKEN to rank your own followers")
            }
            RankError::Fetch(err) if err.is_rate_limited() || err.status == 403 => {
                Some("GitHub rate limit reached; an access token (GITHUB_TOKEN) raises the limit")
            }
            RankError::Fetch(err) if err.status == 401 => Some("Check that the access token is valid"),
            _ => None,
        }
    }
}
