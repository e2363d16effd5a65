//! Inverse-frequency task weights.
//!
//! A task that passes under many prompt variants is easy and earns little;
//! a task that passes under only one variant earns a lot. The weight of task
//! `t` is `total_passes / passes_for(t)`, where both counts are taken over
//! every candidate set of the run.

use std::collections::HashMap;

use serde::Serialize;

use crate::results::CandidateSet;

/// Per-task weights for one scoring run.
///
/// Tasks that never pass have no entry; [`WeightTable::weight`] returns 0
/// for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeightTable {
    pass_counts: HashMap<String, u64>,
    weights: HashMap<String, f64>,
    total_passes: u64,
}

impl WeightTable {
    /// Weight of a task, 0 when the task never passed anywhere.
    pub fn weight(&self, task_id: &str) -> f64 {
        self.weights.get(task_id).copied().unwrap_or(0.0)
    }

    /// Number of passes recorded for a task across all sets.
    pub fn pass_count(&self, task_id: &str) -> u64 {
        self.pass_counts.get(task_id).copied().unwrap_or(0)
    }

    /// Sum of all pass counters.
    pub fn total_passes(&self) -> u64 {
        self.total_passes
    }

    /// Number of distinct tasks with at least one pass.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterates over `(task_id, weight)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(task, w)| (task.as_str(), *w))
    }
}

/// Builds the weight table from every result of every candidate set.
///
/// Must run over the complete collection before any set is scored, otherwise
/// weighted scores of different sets are not comparable.
pub fn compute_weights(sets: &[CandidateSet]) -> WeightTable {
    let mut pass_counts: HashMap<String, u64> = HashMap::new();

    for result in sets.iter().flat_map(|set| set.results.iter()) {
        if result.passed {
            *pass_counts.entry(result.task_id.clone()).or_insert(0) += 1;
        }
    }

    let total_passes: u64 = pass_counts.values().sum();
    let weights = pass_counts
        .iter()
        .map(|(task, count)| (task.clone(), total_passes as f64 / *count as f64))
        .collect();

    WeightTable {
        pass_counts,
        weights,
        total_passes,
    }
}
