//! Error types for prompt-forge operations.
//!
//! Defines error types for the major subsystems:
//! - Result file loading
//! - Candidate-set manifests
//! - External evaluation (functional correctness, test-case runs)
//! - Scoring runs
//! - Prompt projection and dataset utilities
//! - Configuration

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while reading evaluation result files.
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("Results file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read results file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while building, reading or writing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Manifest file not found: {0}")]
    NotFound(PathBuf),

    #[error("Directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("Duplicate prompt_id {prompt_id} in manifest ({first} and {second})")]
    DuplicatePromptId {
        prompt_id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Unsupported manifest version {0}")]
    UnsupportedVersion(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while running an external evaluator.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Invalid command template: {0}")]
    InvalidTemplate(String),

    #[error("Input not found: {0}")]
    MissingInput(PathBuf),

    #[error("Failed to spawn '{command}': {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("Evaluation of '{file}' timed out after {timeout:?}")]
    Timeout { file: PathBuf, timeout: Duration },

    #[error("Evaluator exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Evaluator finished but produced no results file at {0}")]
    ResultsNotProduced(PathBuf),

    #[error("No solution files with extension '{extension}' in {dir}")]
    NoSolutions { dir: PathBuf, extension: String },

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort a whole scoring run.
///
/// Per-set problems (missing or unreadable results, evaluator failures) are
/// never reported here; they are logged and the set is skipped.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Manifest contains no candidate sets")]
    EmptyManifest,

    #[error("None of the {candidates} candidate sets produced readable results")]
    NoResults { candidates: usize },

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while projecting prompt definitions.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur in the dataset utilities.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),

    #[error("Cannot sample {requested} lines from a file with {available}")]
    SampleTooLarge { requested: usize, available: usize },

    #[error("Line {line} of {path} is not a JSON object")]
    NotAnObject { path: PathBuf, line: usize },

    #[error("Line {line} of {path} has no task_id")]
    MissingTaskId { path: PathBuf, line: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
