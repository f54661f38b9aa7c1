//! Score extraction.
//!
//! Each method is bound to a field-extraction rule: a single field read
//! as a number, or the ratio of two fields.

use crate::error::ConfigError;
use crate::models::UserDetails;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ranking criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMethod {
    /// Follower count
    #[default]
    Followers,
    /// Following count
    Following,
    /// Account creation date
    Created,
    /// Public repository count
    Repos,
    /// Public gist count
    Gists,
    /// Followers divided by following
    FfRatio,
}

impl ScoreMethod {
    /// All methods, in documentation order.
    pub const ALL: [ScoreMethod; 6] = [
        ScoreMethod::Followers,
        ScoreMethod::Following,
        ScoreMethod::Created,
        ScoreMethod::Repos,
        ScoreMethod::Gists,
        ScoreMethod::FfRatio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreMethod::Followers => "followers",
            ScoreMethod::Following => "following",
            ScoreMethod::Created => "created",
            ScoreMethod::Repos => "repos",
            ScoreMethod::Gists => "gists",
            ScoreMethod::FfRatio => "ffratio",
        }
    }

    /// The extraction rule bound to this method.
    pub fn rule(&self) -> ScoreRule {
        match self {
            ScoreMethod::Followers => ScoreRule::Single(Field::Followers),
            ScoreMethod::Following => ScoreRule::Single(Field::Following),
            ScoreMethod::Created => ScoreRule::Single(Field::Created),
            ScoreMethod::Repos => ScoreRule::Single(Field::Repos),
            ScoreMethod::Gists => ScoreRule::Single(Field::Gists),
            ScoreMethod::FfRatio => ScoreRule::Ratio(Field::Followers, Field::Following),
        }
    }

    /// Score a single record.
    pub fn score(&self, record: &UserDetails) -> f64 {
        self.rule().apply(record)
    }
}

impl fmt::Display for ScoreMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidMethod(s.to_string()))
    }
}

/// A numeric field of a detail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Followers,
    Following,
    /// Creation time as seconds since the Unix epoch.
    Created,
    Repos,
    Gists,
}

impl Field {
    pub fn value(&self, record: &UserDetails) -> f64 {
        match self {
            Field::Followers => record.followers as f64,
            Field::Following => record.following as f64,
            Field::Created => record.created_at.timestamp() as f64,
            Field::Repos => record.public_repos as f64,
            Field::Gists => record.public_gists as f64,
        }
    }
}

/// How a score is derived from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreRule {
    Single(Field),
    Ratio(Field, Field),
}

impl ScoreRule {
    pub fn apply(&self, record: &UserDetails) -> f64 {
        match self {
            ScoreRule::Single(field) => field.value(record),
            ScoreRule::Ratio(numerator, denominator) => {
                ratio(numerator.value(record), denominator.value(record))
            }
        }
    }
}

/// Divide two counts without producing NaN.
///
/// A zero denominator yields `+inf` (nobody followed means the best
/// possible ratio), except `0 / 0` which yields `0.0`.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        if numerator == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        numerator / denominator
    }
}

/// A score tied to the position of its source record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredPair {
    /// Position of the record in the transformed sequence.
    pub index: usize,
    pub score: f64,
}

/// Score every record, in input order.
pub fn score(records: &[UserDetails], method: ScoreMethod) -> Vec<ScoredPair> {
    let rule = method.rule();
    records
        .iter()
        .enumerate()
        .map(|(index, record)| ScoredPair {
            index,
            score: rule.apply(record),
        })
        .collect()
}
