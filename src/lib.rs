//! prompt-forge: weighted pass-rate scoring for prompt optimization.
//!
//! Prompt variants are scored by the code they produced. Each task is weighted
//! by how rarely it is solved across all variants, every variant is scored by
//! the weights of the tasks it solved, and all variants tied for the best
//! score are kept for the next generation.

pub mod cli;
pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod manifest;
pub mod pipeline;
pub mod prompts;
pub mod results;
pub mod scheduler;
pub mod scoring;

// Re-export commonly used error types
pub use error::{
    ConfigError, DatasetError, EvaluatorError, ManifestError, PromptError, ResultsError,
    ScoringError,
};
