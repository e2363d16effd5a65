//! Serializable record of one scoring run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScoringError;
use crate::results::PromptId;
use crate::scoring::ScoreRecord;

/// Score of one candidate set that took part in the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub prompt_id: PromptId,
    #[serde(flatten)]
    pub score: ScoreRecord,
    /// Results file the score was computed from.
    pub results: PathBuf,
}

/// A candidate set left out of the run, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSet {
    pub prompt_id: PromptId,
    pub reason: String,
}

/// Outcome of [`ScoringPipeline::run`](super::ScoringPipeline::run).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of results files produced by the evaluator during this run.
    pub evaluated: usize,
    /// Scored sets in ascending prompt id order.
    pub records: Vec<SetRecord>,
    /// All sets sharing the maximum weighted score, ascending.
    pub winners: Vec<PromptId>,
    pub max_weighted_score: Option<f64>,
    pub skipped: Vec<SkippedSet>,
    /// Malformed result lines dropped across all files.
    pub skipped_lines: usize,
}

impl ScoringRun {
    /// Wall-clock duration of the run.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn record(&self, prompt_id: &PromptId) -> Option<&SetRecord> {
        self.records.iter().find(|r| &r.prompt_id == prompt_id)
    }

    /// Records of the winning sets.
    pub fn winner_records(&self) -> impl Iterator<Item = &SetRecord> {
        self.records
            .iter()
            .filter(move |r| self.winners.contains(&r.prompt_id))
    }

    /// Writes the run as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<(), ScoringError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
