//! Ordering of scored pairs and reshuffling of the source records.

use crate::analysis::score::ScoredPair;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest score first
    Asc,
    /// Largest score first
    #[default]
    Desc,
}

impl SortOrder {
    pub fn reverse(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    fn compare(&self, a: f64, b: f64) -> Ordering {
        match self {
            SortOrder::Asc => a.total_cmp(&b),
            SortOrder::Desc => b.total_cmp(&a),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ConfigError::InvalidOrder(other.to_string())),
        }
    }
}

/// Sort pairs by score.
///
/// The sort is stable: equal scores keep their input order in either
/// direction. Scores are compared with `f64::total_cmp`, so infinities
/// are ordered like any other value.
pub fn sort(mut pairs: Vec<ScoredPair>, order: SortOrder) -> Vec<ScoredPair> {
    pairs.sort_by(|a, b| order.compare(a.score, b.score));
    pairs
}

/// Reorder `records` into the permutation described by `sorted`.
///
/// Each pair's `index` names a position in `records`. Indexes that are
/// out of range or repeated are skipped.
pub fn reshuffle<T>(records: Vec<T>, sorted: &[ScoredPair]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = records.into_iter().map(Some).collect();
    sorted
        .iter()
        .filter_map(|pair| slots.get_mut(pair.index).and_then(Option::take))
        .collect()
}

/// The scores of a sorted sequence, in order.
pub fn pluck_scores(sorted: &[ScoredPair]) -> Vec<f64> {
    sorted.iter().map(|pair| pair.score).collect()
}
