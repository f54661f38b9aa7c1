//! GitHub-backed fetch collaborators.
//!
//! `GitHubClient` implements both `FollowerSource` and `DetailSource`
//! against the GitHub REST API.

pub mod client;
pub mod details;
pub mod followers;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::{ClientConfig, GitHubClient, MAX_PER_PAGE};
