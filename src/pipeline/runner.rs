//! Scoring pipeline: evaluate what is missing, load, score, select.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::ForgeConfig;
use super::report::{ScoringRun, SetRecord, SkippedSet};
use crate::error::ScoringError;
use crate::evaluator::Evaluator;
use crate::manifest::{Manifest, ManifestEntry};
use crate::results::{load_results, CandidateSet, PromptId};
use crate::scheduler::{retry, run_bounded, BatchSummary};
use crate::scoring::score_all;

/// Runs one scoring pass over the candidate sets of a manifest.
///
/// Per-set failures never abort the run: a set whose evaluation fails or
/// whose results cannot be read is recorded in [`ScoringRun::skipped`] and
/// the remaining sets are scored without it.
pub struct ScoringPipeline {
    config: ForgeConfig,
    evaluator: Option<Arc<dyn Evaluator>>,
}

impl ScoringPipeline {
    pub fn new(config: ForgeConfig) -> Self {
        Self {
            config,
            evaluator: None,
        }
    }

    /// Sets the evaluator used to produce missing results files.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    pub async fn run(&self, manifest: &Manifest) -> Result<ScoringRun, ScoringError> {
        if manifest.is_empty() {
            return Err(ScoringError::EmptyManifest);
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        info!(run_id = %run_id, candidates = manifest.len(), "Starting scoring run");

        let mut skipped = Vec::new();
        let evaluated = self.evaluate_missing(manifest, &mut skipped).await;

        let excluded: HashSet<PromptId> = skipped.iter().map(|s| s.prompt_id.clone()).collect();
        let mut sets = Vec::with_capacity(manifest.len());
        let mut skipped_lines = 0usize;

        for entry in manifest.iter().filter(|e| !excluded.contains(&e.prompt_id)) {
            let path = entry.results_path();
            match load_results(&path) {
                Ok(loaded) => {
                    if loaded.skipped_lines > 0 {
                        warn!(
                            prompt_id = %entry.prompt_id,
                            file = %path.display(),
                            skipped = loaded.skipped_lines,
                            "Dropped malformed result lines"
                        );
                    }
                    skipped_lines += loaded.skipped_lines;
                    sets.push(CandidateSet::new(entry.prompt_id.clone(), loaded.results));
                }
                Err(e) => {
                    warn!(prompt_id = %entry.prompt_id, error = %e, "Skipping candidate set");
                    skipped.push(SkippedSet {
                        prompt_id: entry.prompt_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if sets.is_empty() {
            return Err(ScoringError::NoResults {
                candidates: manifest.len(),
            });
        }

        let outcome = score_all(&sets);
        for (prompt_id, record) in &outcome.scores {
            info!(
                prompt_id = %prompt_id,
                original_score = record.original_score,
                weighted_score = record.weighted_score,
                "Scored candidate set"
            );
        }

        let records = outcome
            .scores
            .iter()
            .map(|(prompt_id, score)| SetRecord {
                prompt_id: prompt_id.clone(),
                score: *score,
                results: manifest
                    .get(prompt_id)
                    .map(ManifestEntry::results_path)
                    .unwrap_or_default(),
            })
            .collect();

        skipped.sort_by(|a, b| a.prompt_id.cmp(&b.prompt_id));

        info!(
            run_id = %run_id,
            scored = sets.len(),
            skipped = skipped.len(),
            winners = ?outcome.selection.winners,
            max_weighted_score = ?outcome.selection.max_weighted_score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scoring run finished"
        );

        Ok(ScoringRun {
            run_id,
            started_at,
            finished_at: Utc::now(),
            evaluated,
            records,
            winners: outcome.selection.winners,
            max_weighted_score: outcome.selection.max_weighted_score,
            skipped,
            skipped_lines,
        })
    }

    /// Produces missing results files; returns how many were produced.
    ///
    /// Failed sets are appended to `skipped`.
    async fn evaluate_missing(&self, manifest: &Manifest, skipped: &mut Vec<SkippedSet>) -> usize {
        let evaluator = match &self.evaluator {
            Some(evaluator) if self.config.evaluate => evaluator,
            _ => return 0,
        };

        let mut pending = Vec::new();
        for entry in manifest.iter() {
            if entry.results_path().exists() {
                continue;
            }
            if !entry.completions.exists() {
                warn!(
                    prompt_id = %entry.prompt_id,
                    file = %entry.completions.display(),
                    "Completions not found, cannot evaluate"
                );
                skipped.push(SkippedSet {
                    prompt_id: entry.prompt_id.clone(),
                    reason: format!("completions not found: {}", entry.completions.display()),
                });
                continue;
            }
            pending.push(entry.clone());
        }

        if pending.is_empty() {
            debug!("All candidate sets already have results");
            return 0;
        }

        info!(
            evaluator = evaluator.name(),
            pending = pending.len(),
            concurrency = self.config.concurrency,
            "Evaluating candidate sets without results"
        );

        let policy = self.config.retry_policy();
        let outcomes = run_bounded(pending, self.config.concurrency, |entry: ManifestEntry| {
            let evaluator = evaluator.clone();
            let policy = policy.clone();
            async move {
                let label = format!("evaluate prompt {}", entry.prompt_id);
                retry(&policy, &label, |_| evaluator.evaluate(&entry)).await
            }
        })
        .await;

        let summary = BatchSummary::of(&outcomes);
        for outcome in outcomes {
            match outcome.result {
                Ok(path) => {
                    debug!(prompt_id = %outcome.key.prompt_id, file = %path.display(), "Results produced");
                }
                Err(e) => {
                    warn!(
                        prompt_id = %outcome.key.prompt_id,
                        attempts = e.attempts,
                        error = %e.last_error,
                        "Evaluation failed, skipping candidate set"
                    );
                    skipped.push(SkippedSet {
                        prompt_id: outcome.key.prompt_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Evaluation finished"
        );
        summary.succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluatorError;
    use async_trait::async_trait;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Writes a fixed results file per prompt id; fails for ids in `broken`.
    struct FakeEvaluator {
        rows: Vec<(i64, &'static str)>,
        broken: Vec<i64>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Evaluator for FakeEvaluator {
        fn name(&self) -> &str {
            "fake"
        }

        async fn evaluate(&self, entry: &ManifestEntry) -> Result<PathBuf, EvaluatorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id = match entry.prompt_id {
                PromptId::Int(id) => id,
                PromptId::Text(_) => return Err(EvaluatorError::InvalidTemplate("text id".into())),
            };
            if self.broken.contains(&id) {
                return Err(EvaluatorError::NonZeroExit {
                    code: 1,
                    stderr: "broken".to_string(),
                });
            }
            let body = self
                .rows
                .iter()
                .find(|(row_id, _)| *row_id == id)
                .map(|(_, body)| *body)
                .unwrap_or("");
            let path = entry.results_path();
            fs::write(&path, body)?;
            Ok(path)
        }
    }

    fn quick_config() -> ForgeConfig {
        ForgeConfig::default()
            .with_max_attempts(2)
            .with_retry_delays(Duration::ZERO, Duration::ZERO)
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "{}\n").unwrap();
        path
    }

    fn scenario_manifest(dir: &Path) -> Manifest {
        Manifest::new(vec![
            ManifestEntry::new(PromptId::Int(1), touch(dir, "s_1.jsonl")),
            ManifestEntry::new(PromptId::Int(2), touch(dir, "s_2.jsonl")),
            ManifestEntry::new(PromptId::Int(3), touch(dir, "s_3.jsonl")),
        ])
        .unwrap()
    }

    const SET_1: &str = "{\"task_id\":\"a\",\"passed\":true}\n{\"task_id\":\"b\",\"passed\":false}\n";
    const SET_2: &str = "{\"task_id\":\"a\",\"passed\":true}\n{\"task_id\":\"b\",\"passed\":true}\n";
    const SET_3: &str = "{\"task_id\":\"a\",\"passed\":true}\nnot json\n{\"task_id\":\"b\",\"passed\":false}\n";

    #[tokio::test]
    async fn test_run_with_existing_results() {
        let dir = TempDir::new().unwrap();
        let manifest = scenario_manifest(dir.path());
        for (entry, body) in manifest.iter().zip([SET_1, SET_2, SET_3]) {
            fs::write(entry.results_path(), body).unwrap();
        }

        let run = ScoringPipeline::new(quick_config()).run(&manifest).await.unwrap();

        // a passes 3 times, b once: weights 4/3 and 4.
        assert_eq!(run.winners, vec![PromptId::Int(2)]);
        let best = run.record(&PromptId::Int(2)).unwrap();
        assert!((best.score.weighted_score - (4.0 / 3.0 + 4.0)).abs() < 1e-9);
        assert_eq!(run.records.len(), 3);
        assert_eq!(run.skipped_lines, 1);
        assert_eq!(run.evaluated, 0);
        assert!(run.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_run_evaluates_missing_and_skips_failures() {
        let dir = TempDir::new().unwrap();
        let manifest = scenario_manifest(dir.path());
        let evaluator = Arc::new(FakeEvaluator {
            rows: vec![(1, SET_1), (3, SET_1)],
            broken: vec![2],
            calls: AtomicU32::new(0),
        });

        let run = ScoringPipeline::new(quick_config())
            .with_evaluator(evaluator.clone())
            .run(&manifest)
            .await
            .unwrap();

        assert_eq!(run.evaluated, 2);
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].prompt_id, PromptId::Int(2));
        assert!(run.skipped[0].reason.contains("gave up after 2 attempts"));
        // Sets 1 and 3 are identical, so both win.
        assert_eq!(run.winners, vec![PromptId::Int(1), PromptId::Int(3)]);
        // 1 + 1 for the good sets, 2 attempts for the broken one.
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_evaluation_disabled_skips_missing_results() {
        let dir = TempDir::new().unwrap();
        let manifest = scenario_manifest(dir.path());
        fs::write(manifest.entries[0].results_path(), SET_1).unwrap();
        let evaluator = Arc::new(FakeEvaluator {
            rows: vec![],
            broken: vec![],
            calls: AtomicU32::new(0),
        });

        let run = ScoringPipeline::new(quick_config().with_evaluate(false))
            .with_evaluator(evaluator.clone())
            .run(&manifest)
            .await
            .unwrap();

        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(run.winners, vec![PromptId::Int(1)]);
        assert_eq!(run.skipped.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_completions_not_evaluated() {
        let dir = TempDir::new().unwrap();
        let present = touch(dir.path(), "s_1.jsonl");
        let manifest = Manifest::new(vec![
            ManifestEntry::new(PromptId::Int(1), present),
            ManifestEntry::new(PromptId::Int(2), dir.path().join("gone_2.jsonl")),
        ])
        .unwrap();
        let evaluator = Arc::new(FakeEvaluator {
            rows: vec![(1, SET_2)],
            broken: vec![],
            calls: AtomicU32::new(0),
        });

        let run = ScoringPipeline::new(quick_config())
            .with_evaluator(evaluator.clone())
            .run(&manifest)
            .await
            .unwrap();

        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(run.skipped[0].prompt_id, PromptId::Int(2));
        assert!(run.skipped[0].reason.contains("completions not found"));
    }

    #[tokio::test]
    async fn test_empty_manifest() {
        let err = ScoringPipeline::new(quick_config())
            .run(&Manifest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::EmptyManifest));
    }

    #[tokio::test]
    async fn test_no_results_anywhere() {
        let dir = TempDir::new().unwrap();
        let manifest = scenario_manifest(dir.path());
        let err = ScoringPipeline::new(quick_config())
            .run(&manifest)
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::NoResults { candidates: 3 }));
    }
}
