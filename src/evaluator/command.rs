//! Functional-correctness evaluation through an external command.
//!
//! The default command is the HumanEval-style
//! `evaluate_functional_correctness` tool, which reads a completions file
//! and writes `<completions>_results.jsonl` next to it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use super::process::{run_process, truncate, CommandTemplate};
use super::Evaluator;
use crate::error::EvaluatorError;
use crate::manifest::{default_results_path, ManifestEntry};

/// Default evaluation command.
pub const DEFAULT_EVALUATE_COMMAND: &str =
    "evaluate_functional_correctness {sample_file} --problem_file={problem_file}";

/// Default timeout for one evaluation run.
pub const DEFAULT_EVALUATE_TIMEOUT: Duration = Duration::from_secs(600);

const STDERR_LIMIT: usize = 2000;

fn pass_at_1_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"'pass@1':\s*([\d.]+)").expect("Invalid pass@1 regex"))
}

/// Extracts the `'pass@1': <value>` figure an evaluator prints, if any.
pub fn parse_pass_at_1(output: &str) -> Option<f64> {
    pass_at_1_pattern()
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Runs an external command to produce a candidate set's results file.
///
/// Placeholders: `{sample_file}` (the completions file) and
/// `{problem_file}` (the reference problem set).
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    template: CommandTemplate,
    problem_file: Option<PathBuf>,
    timeout: Duration,
}

impl CommandEvaluator {
    /// Creates an evaluator from a command template.
    pub fn new(template: &str) -> Result<Self, EvaluatorError> {
        Ok(Self {
            template: CommandTemplate::parse(template)?,
            problem_file: None,
            timeout: DEFAULT_EVALUATE_TIMEOUT,
        })
    }

    /// The default `evaluate_functional_correctness` evaluator.
    pub fn functional_correctness(problem_file: impl Into<PathBuf>) -> Result<Self, EvaluatorError> {
        Ok(Self::new(DEFAULT_EVALUATE_COMMAND)?.with_problem_file(problem_file))
    }

    pub fn with_problem_file(mut self, problem_file: impl Into<PathBuf>) -> Self {
        self.problem_file = Some(problem_file.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }

    fn argv_for(&self, completions: &Path) -> Result<Vec<String>, EvaluatorError> {
        let mut values: HashMap<&str, String> = HashMap::new();
        values.insert("sample_file", completions.display().to_string());
        if let Some(problem_file) = &self.problem_file {
            values.insert("problem_file", problem_file.display().to_string());
        }
        self.template.render(&values)
    }
}

#[async_trait]
impl Evaluator for CommandEvaluator {
    fn name(&self) -> &str {
        "command"
    }

    async fn evaluate(&self, entry: &ManifestEntry) -> Result<PathBuf, EvaluatorError> {
        if !entry.completions.exists() {
            return Err(EvaluatorError::MissingInput(entry.completions.clone()));
        }

        let argv = self.argv_for(&entry.completions)?;
        info!(
            prompt_id = %entry.prompt_id,
            file = %entry.completions.display(),
            "Generating results"
        );

        let output = run_process(&argv, None, self.timeout, &entry.completions).await?;
        if !output.is_success() {
            return Err(EvaluatorError::NonZeroExit {
                code: output.exit_code,
                stderr: truncate(output.stderr.trim(), STDERR_LIMIT),
            });
        }

        let combined = format!("{}{}", output.stdout, output.stderr);
        match parse_pass_at_1(&combined) {
            Some(pass_at_1) => info!(prompt_id = %entry.prompt_id, pass_at_1, "Evaluator reported pass@1"),
            None => warn!(prompt_id = %entry.prompt_id, "Evaluator output has no pass@1 figure"),
        }

        // The tool always writes next to the completions file; move the
        // output when the manifest asks for a different location.
        let produced = default_results_path(&entry.completions);
        let wanted = entry.results_path();
        if produced != wanted && produced.exists() {
            if let Some(parent) = wanted.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::rename(&produced, &wanted)?;
        }

        if !wanted.exists() {
            return Err(EvaluatorError::ResultsNotProduced(wanted));
        }
        Ok(wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::PromptId;
    use tempfile::TempDir;

    #[test]
    fn test_parse_pass_at_1() {
        assert_eq!(parse_pass_at_1("{'pass@1': 0.4375}"), Some(0.4375));
        assert_eq!(parse_pass_at_1("Reading samples...\n{'pass@1':1.0}\n"), Some(1.0));
        assert_eq!(parse_pass_at_1("no figure"), None);
    }

    #[test]
    fn test_argv_uses_problem_file() {
        let evaluator = CommandEvaluator::functional_correctness("/data/train.jsonl").unwrap();
        let argv = evaluator.argv_for(Path::new("/runs/s_1.jsonl")).unwrap();
        assert_eq!(argv[0], "evaluate_functional_correctness");
        assert_eq!(argv[1], "/runs/s_1.jsonl");
        assert_eq!(argv[2], "--problem_file=/data/train.jsonl");
    }

    #[test]
    fn test_argv_without_problem_file_fails() {
        let evaluator = CommandEvaluator::new(DEFAULT_EVALUATE_COMMAND).unwrap();
        assert!(evaluator.argv_for(Path::new("s_1.jsonl")).is_err());
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        let script = dir.join("fake_eval.sh");
        fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_evaluate_produces_results() {
        let dir = TempDir::new().unwrap();
        let script = fake_tool(
            dir.path(),
            "echo \"{'pass@1': 0.5}\"\nprintf '{\"task_id\": \"t1\", \"passed\": true}\\n' > \"$1_results.jsonl\"",
        );
        let completions = dir.path().join("samples_1.jsonl");
        fs::write(&completions, "{}\n").unwrap();

        let evaluator = CommandEvaluator::new(&format!(
            "sh {} {{sample_file}} --problem_file={{problem_file}}",
            script.display()
        ))
        .unwrap()
        .with_problem_file("/data/problems.jsonl");

        let entry = ManifestEntry::new(PromptId::Int(1), &completions);
        let results = evaluator.evaluate(&entry).await.unwrap();
        assert_eq!(results, default_results_path(&completions));
        assert!(fs::read_to_string(&results).unwrap().contains("\"t1\""));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_evaluate_moves_results_to_manifest_location() {
        let dir = TempDir::new().unwrap();
        let script = fake_tool(dir.path(), "echo '{}' > \"$1_results.jsonl\"");
        let completions = dir.path().join("samples_2.jsonl");
        fs::write(&completions, "{}\n").unwrap();
        let wanted = dir.path().join("eval").join("2.jsonl");

        let evaluator = CommandEvaluator::new(&format!("sh {} {{sample_file}}", script.display())).unwrap();
        let entry = ManifestEntry::new(PromptId::Int(2), &completions).with_results(&wanted);

        let results = evaluator.evaluate(&entry).await.unwrap();
        assert_eq!(results, wanted);
        assert!(wanted.exists());
        assert!(!default_results_path(&completions).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_evaluate_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let script = fake_tool(dir.path(), "echo boom >&2\nexit 2");
        let completions = dir.path().join("samples_3.jsonl");
        fs::write(&completions, "{}\n").unwrap();

        let evaluator = CommandEvaluator::new(&format!("sh {} {{sample_file}}", script.display())).unwrap();
        let entry = ManifestEntry::new(PromptId::Int(3), &completions);

        match evaluator.evaluate(&entry).await.unwrap_err() {
            EvaluatorError::NonZeroExit { code, stderr } => {
                assert_eq!(code, 2);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_evaluate_without_results_file() {
        let dir = TempDir::new().unwrap();
        let script = fake_tool(dir.path(), "exit 0");
        let completions = dir.path().join("samples_4.jsonl");
        fs::write(&completions, "{}\n").unwrap();

        let evaluator = CommandEvaluator::new(&format!("sh {} {{sample_file}}", script.display())).unwrap();
        let entry = ManifestEntry::new(PromptId::Int(4), &completions);
        let err = evaluator.evaluate(&entry).await.unwrap_err();
        assert!(matches!(err, EvaluatorError::ResultsNotProduced(_)));
    }

    #[tokio::test]
    async fn test_evaluate_missing_completions() {
        let dir = TempDir::new().unwrap();
        let evaluator = CommandEvaluator::new("true").unwrap();
        let entry = ManifestEntry::new(PromptId::Int(5), dir.path().join("absent_5.jsonl"));
        let err = evaluator.evaluate(&entry).await.unwrap_err();
        assert!(matches!(err, EvaluatorError::MissingInput(_)));
    }
}
