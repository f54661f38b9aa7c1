//! Data models for follower ranking.
//!
//! This module contains the records exchanged with the fetch collaborators
//! and the report document produced from a ranking.

use crate::analysis::{AnalysisResult, ScoreMethod, SortOrder};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One entry of a followers listing. Only the login is used downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follower {
    /// Account handle, used to request the account's details.
    pub login: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl Follower {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            id: None,
            html_url: None,
        }
    }
}

/// Per-account details used for scoring.
///
/// Fields not used for scoring are kept in `extra` so that the record
/// round-trips into the report as the upstream service returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    pub login: String,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub public_gists: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Counters describing a detail lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsMeta {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
}

/// Why the details of a single account could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub status: u16,
    pub message: String,
}

/// Result of a detail lookup.
///
/// `data` keeps the order in which the collaborator inserted the records;
/// the ranking relies on that order for tie-breaking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailsResponse {
    pub meta: DetailsMeta,
    pub data: IndexMap<String, UserDetails>,
    #[serde(default)]
    pub failures: IndexMap<String, FetchFailure>,
}

impl DetailsResponse {
    /// Build a fully successful response from records in order.
    pub fn from_records(records: impl IntoIterator<Item = UserDetails>) -> Self {
        let data: IndexMap<String, UserDetails> = records
            .into_iter()
            .map(|record| (record.login.clone(), record))
            .collect();
        let meta = DetailsMeta {
            total: data.len(),
            success: data.len(),
            failure: 0,
        };
        Self {
            meta,
            data,
            failures: IndexMap::new(),
        }
    }
}

/// Remaining API quota as reported by the upstream service.
///
/// Passed through untouched; the ranking never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Requests allowed per window.
    pub limit: u64,
    /// Requests left in the current window.
    pub remaining: u64,
    /// When the window resets.
    pub reset: DateTime<Utc>,
}

impl fmt::Display for RateLimitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} requests remaining (resets {})",
            self.remaining,
            self.limit,
            self.reset.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Metadata about a ranking report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Whose followers were ranked, or `None` for the token's own account.
    pub username: Option<String>,
    pub method: ScoreMethod,
    pub order: SortOrder,
    pub generated_at: DateTime<Utc>,
    /// Number of ranked accounts.
    pub total: usize,
}

/// The complete ranking report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub metadata: ReportMetadata,
    #[serde(flatten)]
    pub ranking: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
}
