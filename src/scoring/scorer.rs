//! Per-set scoring.

use serde::{Deserialize, Serialize};

use super::weights::WeightTable;
use crate::results::CandidateSet;

/// Scores of one candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Plain pass rate in `[0, 1]`; 0 for an empty set.
    pub original_score: f64,
    /// Sum of task weights over passed results; never negative.
    pub weighted_score: f64,
    /// Number of results in the set.
    pub total: usize,
    /// Number of passed results.
    pub passed: usize,
}

impl ScoreRecord {
    /// Score of a set with no results.
    pub fn empty() -> Self {
        Self {
            original_score: 0.0,
            weighted_score: 0.0,
            total: 0,
            passed: 0,
        }
    }
}

/// Scores one set against a weight table computed over the whole run.
pub fn score_set(set: &CandidateSet, weights: &WeightTable) -> ScoreRecord {
    let mut passed = 0usize;
    let mut weighted_score = 0.0;

    for result in set.results.iter().filter(|r| r.passed) {
        passed += 1;
        weighted_score += weights.weight(&result.task_id);
    }

    let total = set.len();
    let original_score = if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64
    };

    ScoreRecord {
        original_score,
        weighted_score,
        total,
        passed,
    }
}
