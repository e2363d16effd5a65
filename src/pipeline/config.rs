//! Configuration for scoring runs and evaluators.
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional YAML file, and `FORGE_*` environment variables. CLI flags are
//! applied on top by the caller through the builder methods.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EvaluatorError};
use crate::evaluator::{
    CommandEvaluator, TestcaseConfig, DEFAULT_COMPILE_TIMEOUT, DEFAULT_EVALUATE_COMMAND,
    DEFAULT_RUN_COMMAND,
};
use crate::scheduler::retry::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
use crate::scheduler::RetryPolicy;

/// Configuration for the scoring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    // Evaluation settings
    /// Whether missing results files are produced by running the evaluator.
    pub evaluate: bool,
    /// Command template of the functional-correctness evaluator.
    pub evaluate_command: String,
    /// Reference problem set passed as `{problem_file}`.
    pub problem_file: Option<PathBuf>,
    /// Timeout for one evaluator run, in seconds.
    pub evaluate_timeout_secs: u64,
    /// Maximum number of candidate sets evaluated concurrently.
    pub concurrency: usize,

    // Retry settings
    /// Attempts per evaluation; 0 retries until success.
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    pub retry_initial_delay_ms: u64,
    /// Upper bound for one backoff delay, in milliseconds.
    pub retry_max_delay_ms: u64,
    /// Backoff multiplier.
    pub retry_multiplier: f64,

    // Test-case runner settings
    /// Command used to run one translated program.
    pub testcase_run_command: String,
    /// Compile step run before a program's cases, e.g. `javac -d {dir} {file}`.
    pub testcase_compile_command: Option<String>,
    /// Compile timeout, in seconds.
    pub testcase_compile_timeout_secs: u64,
    /// Extension of solution files.
    pub testcase_extension: String,
    /// Suffix of test-case input files.
    pub testcase_input_suffix: String,
    /// Suffix of expected-output files.
    pub testcase_output_suffix: String,
    /// Per-case timeout, in seconds.
    pub testcase_timeout_secs: u64,
    /// Maximum number of programs run concurrently.
    pub testcase_concurrency: usize,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            evaluate: true,
            evaluate_command: DEFAULT_EVALUATE_COMMAND.to_string(),
            problem_file: None,
            evaluate_timeout_secs: 600,
            concurrency: 10,

            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_initial_delay_ms: DEFAULT_INITIAL_DELAY.as_millis() as u64,
            retry_max_delay_ms: DEFAULT_MAX_DELAY.as_millis() as u64,
            retry_multiplier: 2.0,

            testcase_run_command: DEFAULT_RUN_COMMAND.to_string(),
            testcase_compile_command: None,
            testcase_compile_timeout_secs: DEFAULT_COMPILE_TIMEOUT.as_secs(),
            testcase_extension: "py".to_string(),
            testcase_input_suffix: ".in".to_string(),
            testcase_output_suffix: ".out".to_string(),
            testcase_timeout_secs: 10,
            testcase_concurrency: 5,
        }
    }
}

impl ForgeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration: the YAML file when given, then environment
    /// overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a YAML configuration file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FORGE_EVALUATE`: Run the evaluator for missing results (default: true)
    /// - `FORGE_EVALUATE_COMMAND`: Evaluator command template
    /// - `FORGE_PROBLEM_FILE`: Reference problem set
    /// - `FORGE_EVALUATE_TIMEOUT_SECS`: Evaluator timeout (default: 600)
    /// - `FORGE_CONCURRENCY`: Concurrent evaluations (default: 10)
    /// - `FORGE_MAX_ATTEMPTS`: Attempts per evaluation, 0 for unbounded (default: 3)
    /// - `FORGE_RETRY_INITIAL_DELAY_MS`: First backoff delay (default: 1000)
    /// - `FORGE_RETRY_MAX_DELAY_MS`: Backoff cap (default: 30000)
    /// - `FORGE_RETRY_MULTIPLIER`: Backoff multiplier (default: 2.0)
    /// - `FORGE_TESTCASE_RUN_COMMAND`: Program run template (default: `python3 {file}`)
    /// - `FORGE_TESTCASE_COMPILE_COMMAND`: Compile template, unset for interpreted targets
    /// - `FORGE_TESTCASE_COMPILE_TIMEOUT_SECS`: Compile timeout (default: 60)
    /// - `FORGE_TESTCASE_EXTENSION`: Solution extension (default: py)
    /// - `FORGE_TESTCASE_INPUT_SUFFIX`: Test-case input suffix (default: .in)
    /// - `FORGE_TESTCASE_OUTPUT_SUFFIX`: Expected-output suffix (default: .out)
    /// - `FORGE_TESTCASE_TIMEOUT_SECS`: Per-case timeout (default: 10)
    /// - `FORGE_TESTCASE_CONCURRENCY`: Concurrent programs (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `FORGE_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("FORGE_EVALUATE") {
            self.evaluate = parse_env_bool(&val, "FORGE_EVALUATE")?;
        }
        if let Some(val) = lookup("FORGE_EVALUATE_COMMAND") {
            self.evaluate_command = val;
        }
        if let Some(val) = lookup("FORGE_PROBLEM_FILE") {
            self.problem_file = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("FORGE_EVALUATE_TIMEOUT_SECS") {
            self.evaluate_timeout_secs = parse_env_value(&val, "FORGE_EVALUATE_TIMEOUT_SECS")?;
        }
        if let Some(val) = lookup("FORGE_CONCURRENCY") {
            self.concurrency = parse_env_value(&val, "FORGE_CONCURRENCY")?;
        }

        if let Some(val) = lookup("FORGE_MAX_ATTEMPTS") {
            self.max_attempts = parse_env_value(&val, "FORGE_MAX_ATTEMPTS")?;
        }
        if let Some(val) = lookup("FORGE_RETRY_INITIAL_DELAY_MS") {
            self.retry_initial_delay_ms = parse_env_value(&val, "FORGE_RETRY_INITIAL_DELAY_MS")?;
        }
        if let Some(val) = lookup("FORGE_RETRY_MAX_DELAY_MS") {
            self.retry_max_delay_ms = parse_env_value(&val, "FORGE_RETRY_MAX_DELAY_MS")?;
        }
        if let Some(val) = lookup("FORGE_RETRY_MULTIPLIER") {
            self.retry_multiplier = parse_env_value(&val, "FORGE_RETRY_MULTIPLIER")?;
        }

        if let Some(val) = lookup("FORGE_TESTCASE_RUN_COMMAND") {
            self.testcase_run_command = val;
        }
        if let Some(val) = lookup("FORGE_TESTCASE_COMPILE_COMMAND") {
            self.testcase_compile_command = Some(val).filter(|v| !v.trim().is_empty());
        }
        if let Some(val) = lookup("FORGE_TESTCASE_COMPILE_TIMEOUT_SECS") {
            self.testcase_compile_timeout_secs =
                parse_env_value(&val, "FORGE_TESTCASE_COMPILE_TIMEOUT_SECS")?;
        }
        if let Some(val) = lookup("FORGE_TESTCASE_EXTENSION") {
            self.testcase_extension = val;
        }
        if let Some(val) = lookup("FORGE_TESTCASE_INPUT_SUFFIX") {
            self.testcase_input_suffix = val;
        }
        if let Some(val) = lookup("FORGE_TESTCASE_OUTPUT_SUFFIX") {
            self.testcase_output_suffix = val;
        }
        if let Some(val) = lookup("FORGE_TESTCASE_TIMEOUT_SECS") {
            self.testcase_timeout_secs = parse_env_value(&val, "FORGE_TESTCASE_TIMEOUT_SECS")?;
        }
        if let Some(val) = lookup("FORGE_TESTCASE_CONCURRENCY") {
            self.testcase_concurrency = parse_env_value(&val, "FORGE_TESTCASE_CONCURRENCY")?;
        }
        Ok(())
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluate_command.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "evaluate_command cannot be empty".to_string(),
            ));
        }

        if self.evaluate_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "evaluate_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "concurrency must be greater than 0".to_string(),
            ));
        }

        if !self.retry_multiplier.is_finite() || self.retry_multiplier < 1.0 {
            return Err(ConfigError::ValidationFailed(
                "retry_multiplier must be at least 1.0".to_string(),
            ));
        }

        if self.retry_initial_delay_ms > self.retry_max_delay_ms {
            return Err(ConfigError::ValidationFailed(
                "retry_initial_delay_ms cannot exceed retry_max_delay_ms".to_string(),
            ));
        }

        if self.testcase_run_command.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "testcase_run_command cannot be empty".to_string(),
            ));
        }

        if self
            .testcase_compile_command
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(ConfigError::ValidationFailed(
                "testcase_compile_command cannot be empty when set".to_string(),
            ));
        }

        if self.testcase_compile_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "testcase_compile_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.testcase_extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::ValidationFailed(
                "testcase_extension cannot be empty".to_string(),
            ));
        }

        if self.testcase_input_suffix.is_empty()
            || self.testcase_output_suffix.is_empty()
            || self.testcase_input_suffix == self.testcase_output_suffix
        {
            return Err(ConfigError::ValidationFailed(
                "testcase input and output suffixes must be non-empty and distinct".to_string(),
            ));
        }

        if self.testcase_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "testcase_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.testcase_concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "testcase_concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Retry policy for evaluator runs.
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = if self.max_attempts == 0 {
            RetryPolicy::unbounded()
        } else {
            RetryPolicy::new(self.max_attempts)
        };
        policy
            .with_initial_delay(Duration::from_millis(self.retry_initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.retry_max_delay_ms))
            .with_multiplier(self.retry_multiplier)
    }

    pub fn evaluate_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluate_timeout_secs)
    }

    /// Builds the functional-correctness evaluator described by this config.
    pub fn command_evaluator(&self) -> Result<CommandEvaluator, EvaluatorError> {
        let evaluator =
            CommandEvaluator::new(&self.evaluate_command)?.with_timeout(self.evaluate_timeout());
        Ok(match &self.problem_file {
            Some(problem_file) => evaluator.with_problem_file(problem_file),
            None => evaluator,
        })
    }

    /// Test-case runner settings for the given test-case directory.
    pub fn testcase_config(&self, testcase_dir: impl Into<PathBuf>) -> TestcaseConfig {
        let config = TestcaseConfig::new(testcase_dir)
            .with_extension(self.testcase_extension.clone())
            .with_suffixes(
                self.testcase_input_suffix.clone(),
                self.testcase_output_suffix.clone(),
            )
            .with_run_command(self.testcase_run_command.clone())
            .with_case_timeout(Duration::from_secs(self.testcase_timeout_secs))
            .with_concurrency(self.testcase_concurrency)
            .with_compile_timeout(Duration::from_secs(self.testcase_compile_timeout_secs));
        match &self.testcase_compile_command {
            Some(command) => config.with_compile_command(command.clone()),
            None => config,
        }
    }

    /// Builder method to enable or disable evaluation of missing results.
    pub fn with_evaluate(mut self, evaluate: bool) -> Self {
        self.evaluate = evaluate;
        self
    }

    /// Builder method to set the evaluator command template.
    pub fn with_evaluate_command(mut self, command: impl Into<String>) -> Self {
        self.evaluate_command = command.into();
        self
    }

    /// Builder method to set the reference problem file.
    pub fn with_problem_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.problem_file = Some(path.into());
        self
    }

    /// Builder method to set the evaluator timeout.
    pub fn with_evaluate_timeout(mut self, timeout: Duration) -> Self {
        self.evaluate_timeout_secs = timeout.as_secs();
        self
    }

    /// Builder method to set evaluation concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Builder method to set attempts per evaluation (0 for unbounded).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Builder method to set the retry backoff delays.
    pub fn with_retry_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.retry_initial_delay_ms = initial.as_millis() as u64;
        self.retry_max_delay_ms = max.as_millis() as u64;
        self
    }

    /// Builder method to set the test-case run command.
    pub fn with_testcase_run_command(mut self, command: impl Into<String>) -> Self {
        self.testcase_run_command = command.into();
        self
    }

    /// Builder method to set the solution extension.
    pub fn with_testcase_extension(mut self, extension: impl Into<String>) -> Self {
        self.testcase_extension = extension.into();
        self
    }

    /// Builder method to set the compile step of compiled targets.
    pub fn with_testcase_compile_command(mut self, command: impl Into<String>) -> Self {
        self.testcase_compile_command = Some(command.into());
        self
    }

    /// Builder method to set the test-case input and output suffixes.
    pub fn with_testcase_suffixes(
        mut self,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        self.testcase_input_suffix = input.into();
        self.testcase_output_suffix = output.into();
        self
    }

    /// Builder method to set the per-case timeout.
    pub fn with_testcase_timeout(mut self, timeout: Duration) -> Self {
        self.testcase_timeout_secs = timeout.as_secs();
        self
    }

    /// Builder method to set test-case concurrency.
    pub fn with_testcase_concurrency(mut self, concurrency: usize) -> Self {
        self.testcase_concurrency = concurrency;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ForgeConfig::default();
        assert!(config.evaluate);
        assert_eq!(config.evaluate_command, DEFAULT_EVALUATE_COMMAND);
        assert_eq!(config.evaluate_timeout(), Duration::from_secs(600));
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.testcase_concurrency, 5);
        assert_eq!(config.testcase_timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ForgeConfig::new()
            .with_evaluate(false)
            .with_problem_file("/data/problems.jsonl")
            .with_evaluate_timeout(Duration::from_secs(60))
            .with_concurrency(4)
            .with_max_attempts(0)
            .with_testcase_extension("cpp")
            .with_testcase_concurrency(2);

        assert!(!config.evaluate);
        assert_eq!(config.problem_file, Some(PathBuf::from("/data/problems.jsonl")));
        assert_eq!(config.evaluate_timeout_secs, 60);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.retry_policy().max_attempts, None);
        assert_eq!(config.testcase_extension, "cpp");
        assert_eq!(config.testcase_concurrency, 2);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ForgeConfig::default();
        config
            .apply_env(env(&[
                ("FORGE_EVALUATE", "no"),
                ("FORGE_CONCURRENCY", "3"),
                ("FORGE_MAX_ATTEMPTS", "5"),
                ("FORGE_PROBLEM_FILE", "train.jsonl"),
                ("FORGE_TESTCASE_RUN_COMMAND", "node {file}"),
            ]))
            .unwrap();

        assert!(!config.evaluate);
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.retry_policy().max_attempts, Some(5));
        assert_eq!(config.problem_file, Some(PathBuf::from("train.jsonl")));
        assert_eq!(config.testcase_run_command, "node {file}");
    }

    #[test]
    fn test_env_overrides_testcase_layout() {
        let mut config = ForgeConfig::default();
        config
            .apply_env(env(&[
                ("FORGE_TESTCASE_INPUT_SUFFIX", "_in.txt"),
                ("FORGE_TESTCASE_OUTPUT_SUFFIX", "_out.txt"),
                ("FORGE_TESTCASE_COMPILE_COMMAND", "javac --release 8 {file}"),
                ("FORGE_TESTCASE_COMPILE_TIMEOUT_SECS", "120"),
            ]))
            .unwrap();
        assert!(config.validate().is_ok());

        let tc = config.testcase_config("/cases");
        assert_eq!(tc.input_suffix, "_in.txt");
        assert_eq!(tc.output_suffix, "_out.txt");
        assert_eq!(tc.compile_command.as_deref(), Some("javac --release 8 {file}"));
        assert_eq!(tc.compile_timeout, Duration::from_secs(120));

        config
            .apply_env(env(&[("FORGE_TESTCASE_COMPILE_COMMAND", "")]))
            .unwrap();
        assert!(config.testcase_config("/cases").compile_command.is_none());
    }

    #[test]
    fn test_env_invalid_value() {
        let mut config = ForgeConfig::default();
        let err = config
            .apply_env(env(&[("FORGE_CONCURRENCY", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("FORGE_CONCURRENCY"));

        let err = config
            .apply_env(env(&[("FORGE_EVALUATE", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_yaml_file_keeps_defaults_for_missing_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forge.yaml");
        std::fs::write(
            &path,
            "concurrency: 2\nproblem_file: data/train.jsonl\nmax_attempts: 1\n",
        )
        .unwrap();

        let config = ForgeConfig::from_file(&path).unwrap();
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.problem_file, Some(PathBuf::from("data/train.jsonl")));
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.evaluate_timeout_secs, 600);
        assert_eq!(config.testcase_extension, "py");
    }

    #[test]
    fn test_yaml_unknown_type_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forge.yaml");
        std::fs::write(&path, "concurrency: lots\n").unwrap();
        assert!(matches!(
            ForgeConfig::from_file(&path),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let cases = vec![
            (ForgeConfig::default().with_concurrency(0), "concurrency"),
            (ForgeConfig::default().with_evaluate_command("  "), "evaluate_command"),
            (
                ForgeConfig::default().with_evaluate_timeout(Duration::ZERO),
                "evaluate_timeout_secs",
            ),
            (
                ForgeConfig::default().with_testcase_concurrency(0),
                "testcase_concurrency",
            ),
            (
                ForgeConfig::default().with_testcase_suffixes(".io", ".io"),
                "suffixes",
            ),
            (
                ForgeConfig::default().with_testcase_compile_command(" "),
                "testcase_compile_command",
            ),
            (
                ForgeConfig::default()
                    .with_retry_delays(Duration::from_secs(10), Duration::from_secs(1)),
                "retry_initial_delay_ms",
            ),
        ];

        for (config, field) in cases {
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains(field), "{} not in {}", field, err);
        }
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = ForgeConfig::default()
            .with_retry_delays(Duration::from_millis(200), Duration::from_secs(2))
            .retry_policy();
        assert_eq!(policy.max_attempts, Some(3));
        assert_eq!(policy.initial_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_testcase_config_from_config() {
        let config = ForgeConfig::default()
            .with_testcase_extension("cpp")
            .with_testcase_run_command("./run {file}");
        let tc = config.testcase_config("/cases");
        assert_eq!(tc.testcase_dir, PathBuf::from("/cases"));
        assert_eq!(tc.extension, "cpp");
        assert_eq!(tc.run_command, "./run {file}");
        assert_eq!(tc.case_timeout, Duration::from_secs(10));
        assert_eq!(tc.concurrency, 5);
        assert!(tc.compile_command.is_none());
        assert_eq!(tc.input_suffix, ".in");
    }

    #[test]
    fn test_command_evaluator_from_config() {
        let config = ForgeConfig::default().with_problem_file("/data/train.jsonl");
        let evaluator = config.command_evaluator().unwrap();
        assert_eq!(evaluator.template().to_string(), DEFAULT_EVALUATE_COMMAND);
    }
}
