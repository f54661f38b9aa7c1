//! The analysis stage: transform, score, sort, reshuffle.

use crate::analysis::order::{pluck_scores, reshuffle, sort, SortOrder};
use crate::analysis::score::{score, ScoreMethod};
use crate::analysis::transform::transform;
use crate::models::UserDetails;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings for a single analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub method: ScoreMethod,
    pub order: SortOrder,
}

impl AnalysisConfig {
    pub fn new(method: ScoreMethod, order: SortOrder) -> Self {
        Self { method, order }
    }

    /// The direction actually handed to the sort.
    ///
    /// `created` ranks older accounts higher, so its requested direction is
    /// inverted: `desc` yields oldest first and `asc` newest first. Every
    /// other method sorts in the requested direction.
    pub fn effective_order(&self) -> SortOrder {
        match self.method {
            ScoreMethod::Created => self.order.reverse(),
            _ => self.order,
        }
    }
}

/// Ranked records and their scores.
///
/// `results[i]` is the score of `data[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub data: Vec<UserDetails>,
    pub results: Vec<f64>,
}

impl AnalysisResult {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over `(record, score)` in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&UserDetails, f64)> {
        self.data.iter().zip(self.results.iter().copied())
    }
}

/// Rank follower details.
///
/// Deterministic: the output depends only on `config` and the contents
/// and insertion order of `data`.
pub fn analyze(config: &AnalysisConfig, data: IndexMap<String, UserDetails>) -> AnalysisResult {
    let records = transform(data);
    let order = config.effective_order();

    debug!(
        "Scoring {} records by {} ({} requested, sorting {})",
        records.len(),
        config.method,
        config.order,
        order
    );

    let sorted = sort(score(&records, config.method), order);
    let results = pluck_scores(&sorted);
    let data = reshuffle(records, &sorted);

    AnalysisResult { data, results }
}
