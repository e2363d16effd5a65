//! Scheduling helpers for work that leaves the process.
//!
//! - **retry**: [`RetryPolicy`] with exponential backoff and a distinguishable
//!   [`RetryExhausted`] outcome
//! - **batch**: [`run_bounded`], a semaphore-bounded "wait for all, keep every
//!   outcome" runner
//!
//! # Example
//!
//! ```rust,ignore
//! use prompt_forge::scheduler::{retry, run_bounded, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3);
//! let outcomes = run_bounded(files, 10, |file| {
//!     let policy = policy.clone();
//!     async move { retry(&policy, "evaluate", |_| evaluate(&file)).await }
//! })
//! .await;
//! ```

pub mod batch;
pub mod retry;

pub use batch::{run_bounded, BatchSummary, UnitOutcome};
pub use retry::{retry, RetryExhausted, RetryPolicy};
