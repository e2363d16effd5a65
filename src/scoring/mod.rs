//! Weighted pass-rate scoring and best-candidate selection.
//!
//! Scoring is a pure two-pass aggregation over an immutable snapshot of
//! candidate sets:
//!
//! 1. [`compute_weights`] counts passes per task over *all* sets and derives
//!    inverse-frequency weights.
//! 2. [`score_set`] scores each set against that table.
//! 3. [`select_winners`] keeps every set attaining the maximum weighted score.
//!
//! ```
//! use prompt_forge::results::{CandidateSet, EvaluationResult, PromptId};
//! use prompt_forge::scoring::score_all;
//!
//! let sets = vec![
//!     CandidateSet::new(PromptId::Int(1), vec![
//!         EvaluationResult::pass("t1"),
//!         EvaluationResult::pass("t2"),
//!     ]),
//!     CandidateSet::new(PromptId::Int(2), vec![
//!         EvaluationResult::pass("t1"),
//!         EvaluationResult::fail("t2"),
//!     ]),
//! ];
//!
//! let outcome = score_all(&sets);
//! assert_eq!(outcome.selection.winners, vec![PromptId::Int(1)]);
//! assert_eq!(outcome.scores[&PromptId::Int(1)].weighted_score, 4.5);
//! ```

mod scorer;
mod selection;
mod weights;

use std::collections::BTreeMap;

use tracing::warn;

pub use scorer::{score_set, ScoreRecord};
pub use selection::{scores_tie, select_winners, Selection, TIE_EPSILON};
pub use weights::{compute_weights, WeightTable};

use crate::results::{CandidateSet, PromptId};

/// Everything produced by one scoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOutcome {
    pub weights: WeightTable,
    pub scores: BTreeMap<PromptId, ScoreRecord>,
    pub selection: Selection,
}

/// Computes weights, scores every set and selects the winners.
///
/// If two sets share a prompt id, both feed the weight table but only the
/// first one is scored.
pub fn score_all(sets: &[CandidateSet]) -> ScoringOutcome {
    let weights = compute_weights(sets);

    let mut scores = BTreeMap::new();
    for set in sets {
        if scores.contains_key(&set.prompt_id) {
            warn!(prompt_id = %set.prompt_id, "Duplicate candidate set, keeping the first");
            continue;
        }
        scores.insert(set.prompt_id.clone(), score_set(set, &weights));
    }

    let selection = select_winners(&scores);

    ScoringOutcome {
        weights,
        scores,
        selection,
    }
}
