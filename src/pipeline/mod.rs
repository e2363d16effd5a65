//! Scoring pipeline.
//!
//! Composes the manifest, the evaluators, result loading and the weighted
//! scorer into a single run.
//!
//! # Pipeline Flow
//!
//! 1. **Evaluation**: candidate sets without a results file are evaluated,
//!    at most `concurrency` at a time, each under the configured retry policy
//! 2. **Loading**: every results file is read; corrupt lines are dropped and
//!    counted, unreadable files skip their set
//! 3. **Scoring**: task weights are computed over all loaded sets, then every
//!    set is scored
//! 4. **Selection**: all sets sharing the maximum weighted score win
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prompt_forge::manifest::Manifest;
//! use prompt_forge::pipeline::{ForgeConfig, ScoringPipeline};
//!
//! let config = ForgeConfig::load(None)?.with_problem_file("data/train.jsonl");
//! let evaluator = Arc::new(config.command_evaluator()?);
//! let manifest = Manifest::discover(Path::new("runs/generation-3"))?;
//!
//! let run = ScoringPipeline::new(config)
//!     .with_evaluator(evaluator)
//!     .run(&manifest)
//!     .await?;
//! println!("winners: {:?}", run.winners);
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! // Via builder pattern
//! let config = ForgeConfig::new().with_concurrency(4).with_max_attempts(5);
//!
//! // Via environment variables
//! let config = ForgeConfig::from_env()?;
//! ```

pub mod config;
pub mod report;
pub mod runner;

pub use config::ForgeConfig;
pub use report::{ScoringRun, SetRecord, SkippedSet};
pub use runner::ScoringPipeline;
