//! Dataset utilities used around the optimization loop.
//!
//! - [`sample_lines`]: random training subset, reproducible under a seed
//! - [`merge_completions`]: fill empty completions from a second run
//! - [`normalize_tasks`]: renumber task ids and unescape text fields in place

mod merge;
mod normalize;
mod sample;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::DatasetError;

pub use merge::{merge_completions, MergeStats};
pub use normalize::{clean_escapes, normalize_tasks, TEXT_FIELDS};
pub use sample::{sample_indices, sample_lines};

/// Reads a JSONL file of objects, paired with their 1-based line numbers.
/// Blank lines are skipped; anything else that is not an object is an error.
fn read_records(path: &Path) -> Result<Vec<(usize, Map<String, Value>)>, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&line)? {
            Value::Object(map) => records.push((index + 1, map)),
            _ => {
                return Err(DatasetError::NotAnObject {
                    path: path.to_path_buf(),
                    line: index + 1,
                })
            }
        }
    }
    Ok(records)
}

/// The record's `task_id` as a string; numbers are rendered as written.
fn task_key(record: &Map<String, Value>) -> Option<String> {
    match record.get("task_id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_records_rejects_non_objects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"task_id\": 1}\n\n[1, 2]\n").unwrap();
        let err = read_records(&path).unwrap_err();
        assert!(matches!(err, DatasetError::NotAnObject { line: 3, .. }));
    }

    #[test]
    fn test_task_key() {
        let record: Map<String, Value> =
            serde_json::from_str("{\"task_id\": 12}").unwrap();
        assert_eq!(task_key(&record), Some("12".to_string()));
        let record: Map<String, Value> = serde_json::from_str("{\"id\": 12}").unwrap();
        assert_eq!(task_key(&record), None);
    }
}
