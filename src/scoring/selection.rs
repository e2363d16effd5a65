//! Best-candidate selection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::scorer::ScoreRecord;
use crate::results::PromptId;

/// Relative tolerance under which two weighted scores count as a tie.
///
/// Weighted scores are float sums; the same weights added in a different
/// order can differ in the last bits.
pub const TIE_EPSILON: f64 = 1e-9;

/// Returns true when two weighted scores are equal for selection purposes.
pub fn scores_tie(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= TIE_EPSILON * scale
}

/// Winners of a scoring run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Every prompt id attaining the maximum weighted score, ascending.
    pub winners: Vec<PromptId>,
    /// The maximum weighted score, `None` when there was nothing to select.
    pub max_weighted_score: Option<f64>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    pub fn contains(&self, prompt_id: &PromptId) -> bool {
        self.winners.contains(prompt_id)
    }
}

/// Picks the prompt ids with the maximum weighted score.
///
/// Sets are visited in ascending `prompt_id` order. A strictly higher score
/// resets the winners list, a tie appends to it, so every tied set is kept.
pub fn select_winners(scores: &BTreeMap<PromptId, ScoreRecord>) -> Selection {
    let mut best: Option<f64> = None;
    let mut winners: Vec<PromptId> = Vec::new();

    for (prompt_id, record) in scores {
        let score = record.weighted_score;
        match best {
            Some(max) if scores_tie(score, max) => winners.push(prompt_id.clone()),
            Some(max) if score < max => {}
            _ => {
                best = Some(score);
                winners.clear();
                winners.push(prompt_id.clone());
            }
        }
    }

    Selection {
        winners,
        max_weighted_score: best,
    }
}
