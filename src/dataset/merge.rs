//! Filling empty completions from a second generation run.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{read_records, task_key};
use crate::error::DatasetError;

/// Counts of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Records written.
    pub total: usize,
    /// Empty completions replaced from the fallback file.
    pub filled: usize,
    /// Empty completions with no fallback record.
    pub missing: usize,
}

/// Writes `primary` to `output`, replacing every empty `completion` with the
/// fallback file's completion for the same `task_id`.
pub fn merge_completions(
    primary: &Path,
    fallback: &Path,
    output: &Path,
) -> Result<MergeStats, DatasetError> {
    let records = read_records(primary)?;
    let fallback_records = read_records(fallback)?;

    let mut by_task: HashMap<String, Map<String, Value>> = HashMap::new();
    for (line, record) in fallback_records {
        let key = task_key(&record).ok_or_else(|| DatasetError::MissingTaskId {
            path: fallback.to_path_buf(),
            line,
        })?;
        by_task.entry(key).or_insert(record);
    }

    let mut stats = MergeStats::default();
    let mut merged = Vec::with_capacity(records.len());
    for (line, mut record) in records {
        let key = task_key(&record).ok_or_else(|| DatasetError::MissingTaskId {
            path: primary.to_path_buf(),
            line,
        })?;

        let empty = matches!(record.get("completion"), Some(Value::String(s)) if s.is_empty());
        if empty {
            match by_task.get(&key).and_then(|r| r.get("completion")) {
                Some(completion) => {
                    debug!(task_id = %key, "Filled empty completion");
                    record.insert("completion".to_string(), completion.clone());
                    stats.filled += 1;
                }
                None => {
                    warn!(task_id = %key, "No fallback completion for task");
                    stats.missing += 1;
                }
            }
        }
        merged.push(record);
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(output)?);
    for record in &merged {
        writeln!(writer, "{}", serde_json::to_string(record)?)?;
    }
    writer.flush()?;
    stats.total = merged.len();

    info!(
        output = %output.display(),
        total = stats.total,
        filled = stats.filled,
        missing = stats.missing,
        "Merged completions"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fills_only_empty_completions() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("mod.jsonl");
        let fallback = dir.path().join("sanitized.jsonl");
        let output = dir.path().join("merged.jsonl");

        fs::write(
            &primary,
            concat!(
                "{\"task_id\": \"HumanEval/0\", \"completion\": \"\"}\n",
                "{\"task_id\": \"HumanEval/1\", \"completion\": \"return 1\"}\n",
                "{\"task_id\": \"HumanEval/2\", \"completion\": \"\"}\n",
            ),
        )
        .unwrap();
        fs::write(
            &fallback,
            concat!(
                "{\"task_id\": \"HumanEval/0\", \"completion\": \"return 0\"}\n",
                "{\"task_id\": \"HumanEval/1\", \"completion\": \"return -1\"}\n",
            ),
        )
        .unwrap();

        let stats = merge_completions(&primary, &fallback, &output).unwrap();
        assert_eq!(stats, MergeStats { total: 3, filled: 1, missing: 1 });

        let rows: Vec<Value> = fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows[0]["completion"], "return 0");
        assert_eq!(rows[1]["completion"], "return 1");
        assert_eq!(rows[2]["completion"], "");
    }

    #[test]
    fn test_missing_task_id_is_error() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("a.jsonl");
        let fallback = dir.path().join("b.jsonl");
        fs::write(&primary, "{\"completion\": \"\"}\n").unwrap();
        fs::write(&fallback, "").unwrap();

        let err = merge_completions(&primary, &fallback, &dir.path().join("out.jsonl")).unwrap_err();
        assert!(matches!(err, DatasetError::MissingTaskId { line: 1, .. }));
    }
}
