//! External evaluators that turn a candidate set into a results file.
//!
//! - [`CommandEvaluator`]: runs a functional-correctness tool over a
//!   completions file
//! - [`TestcaseEvaluator`]: runs translated programs against stdin/stdout
//!   test cases
//!
//! Both are reached through the [`Evaluator`] trait so the scoring pipeline
//! can retry and bound them without knowing which one it drives.

mod command;
mod process;
mod testcase;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::EvaluatorError;
use crate::manifest::ManifestEntry;

pub use command::{
    parse_pass_at_1, CommandEvaluator, DEFAULT_EVALUATE_COMMAND, DEFAULT_EVALUATE_TIMEOUT,
};
pub use process::{run_process, truncate, CommandTemplate, ProcessOutput};
pub use testcase::{
    output_matches, public_class_name, write_reports, SolutionReport, TestCase, TestcaseConfig,
    TestcaseEvaluator, DEFAULT_CASE_TIMEOUT, DEFAULT_COMPILE_TIMEOUT, DEFAULT_RUN_COMMAND,
    DEFAULT_TESTCASE_CONCURRENCY,
};

/// Produces the results file of one manifest entry.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Evaluates the entry and returns the path of the results file written.
    async fn evaluate(&self, entry: &ManifestEntry) -> Result<PathBuf, EvaluatorError>;
}
