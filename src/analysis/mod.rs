//! Ranking analysis.
//!
//! Turns a keyed set of account details into an ordered ranking:
//! transform, score, sort, then reshuffle the records to match.

pub mod analyze;
pub mod order;
pub mod score;
pub mod transform;

pub use analyze::{analyze, AnalysisConfig, AnalysisResult};
pub use order::{pluck_scores, reshuffle, sort, SortOrder};
pub use score::{ratio, score, Field, ScoreMethod, ScoreRule, ScoredPair};
pub use transform::transform;
