//! follower-rank - rank a GitHub user's followers.
//!
//! Fetches an account's followers, fetches every follower's details and
//! ranks them by one of several metrics. The fetches go through the
//! [`FollowerSource`] and [`DetailSource`] traits; [`GitHubClient`]
//! implements both against the GitHub REST API.
//!
//! ```no_run
//! use follower_rank::{GitHubClient, ClientConfig, RankOptions, Ranker, ScoreMethod};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = Arc::new(GitHubClient::new(ClientConfig::default())?);
//! let options = RankOptions::for_username("octocat").with_method(ScoreMethod::FfRatio);
//! let ranker = Ranker::new(options, client.clone(), client)?;
//!
//! let output = ranker.run().await;
//! for (record, score) in output.result?.iter() {
//!     println!("{} {}", record.login, score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod models;
pub mod pipeline;
pub mod report;

pub use analysis::{analyze, AnalysisConfig, AnalysisResult, ScoreMethod, SortOrder};
pub use error::{ConfigError, FetchError, RankError};
pub use github::{ClientConfig, GitHubClient};
pub use models::{DetailsResponse, Follower, RateLimitInfo, UserDetails};
pub use pipeline::{
    rank, DetailSource, DetailsRequest, Fetched, FollowerSource, FollowersRequest, RankOptions,
    RankOutput, Ranker,
};
