//! Evaluation results and candidate sets.
//!
//! A candidate set is the collection of solutions generated under one prompt
//! variant. After an external evaluator has run, each set owns one
//! [`EvaluationResult`] per generated solution. Results are read-only from
//! the point of view of this crate.

mod loader;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use loader::{load_results, parse_results, LoadedResults};

/// Identifier of a prompt variant.
///
/// Prompt files in the wild use both integer and string ids. Integers order
/// numerically and sort before strings, so `2 < 10 < "a"`. The integer `3` and
/// the string `"3"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptId {
    Int(i64),
    Text(String),
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptId::Int(id) => write!(f, "{}", id),
            PromptId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for PromptId {
    fn from(id: i64) -> Self {
        PromptId::Int(id)
    }
}

impl From<&str> for PromptId {
    fn from(id: &str) -> Self {
        PromptId::Text(id.to_string())
    }
}

impl FromStr for PromptId {
    type Err = std::convert::Infallible;

    /// Parses command-line input: anything that looks like an integer is an
    /// integer id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<i64>() {
            Ok(id) => PromptId::Int(id),
            Err(_) => PromptId::Text(trimmed.to_string()),
        })
    }
}

/// Outcome of evaluating one generated solution against its task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Opaque task identifier, unique within one candidate set.
    pub task_id: String,
    /// Whether the solution passed every test of the task.
    pub passed: bool,
}

impl EvaluationResult {
    pub fn new(task_id: impl Into<String>, passed: bool) -> Self {
        Self {
            task_id: task_id.into(),
            passed,
        }
    }

    pub fn pass(task_id: impl Into<String>) -> Self {
        Self::new(task_id, true)
    }

    pub fn fail(task_id: impl Into<String>) -> Self {
        Self::new(task_id, false)
    }
}

/// All evaluation results produced under one prompt variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet {
    pub prompt_id: PromptId,
    pub results: Vec<EvaluationResult>,
}

impl CandidateSet {
    pub fn new(prompt_id: PromptId, results: Vec<EvaluationResult>) -> Self {
        Self { prompt_id, results }
    }

    /// Number of evaluation results in the set.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of results that passed.
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_id_ordering() {
        let mut ids = vec![
            PromptId::from("b"),
            PromptId::Int(10),
            PromptId::from("a"),
            PromptId::Int(2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                PromptId::Int(2),
                PromptId::Int(10),
                PromptId::from("a"),
                PromptId::from("b"),
            ]
        );
    }

    #[test]
    fn test_prompt_id_from_str() {
        assert_eq!("7".parse::<PromptId>().unwrap(), PromptId::Int(7));
        assert_eq!(" 7 ".parse::<PromptId>().unwrap(), PromptId::Int(7));
        assert_eq!(
            "seed".parse::<PromptId>().unwrap(),
            PromptId::Text("seed".to_string())
        );
    }

    #[test]
    fn test_prompt_id_serde_untagged() {
        let int: PromptId = serde_json::from_str("3").unwrap();
        let text: PromptId = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(int, PromptId::Int(3));
        assert_eq!(text, PromptId::Text("3".to_string()));
        assert_ne!(int, text);
        assert_eq!(serde_json::to_string(&int).unwrap(), "3");
    }

    #[test]
    fn test_candidate_set_counts() {
        let set = CandidateSet::new(
            PromptId::Int(1),
            vec![
                EvaluationResult::pass("t1"),
                EvaluationResult::fail("t2"),
                EvaluationResult::pass("t3"),
            ],
        );
        assert_eq!(set.len(), 3);
        assert_eq!(set.passed_count(), 2);
        assert!(!set.is_empty());
        assert!(CandidateSet::new(PromptId::Int(2), Vec::new()).is_empty());
    }
}
