//! Reading newline-delimited JSON result files.
//!
//! Result files are written by external evaluators and are not always clean:
//! blank lines and truncated records show up when an evaluator is killed
//! mid-write. Bad lines are dropped with a warning instead of failing the
//! whole file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use super::EvaluationResult;
use crate::error::ResultsError;

/// Maximum number of characters of a rejected line echoed into the log.
const LINE_PREVIEW_CHARS: usize = 120;

/// Results parsed from one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedResults {
    /// Well-formed records, in file order.
    pub results: Vec<EvaluationResult>,
    /// Number of non-blank lines that could not be parsed.
    pub skipped_lines: usize,
}

/// On-disk shape of a result row. Extra diagnostic fields are ignored.
#[derive(Debug, Deserialize)]
struct ResultRow {
    #[serde(alias = "file_id")]
    task_id: TaskIdValue,
    #[serde(default)]
    passed: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TaskIdValue {
    Text(String),
    Int(i64),
}

impl From<ResultRow> for EvaluationResult {
    fn from(row: ResultRow) -> Self {
        let task_id = match row.task_id {
            TaskIdValue::Text(id) => id,
            TaskIdValue::Int(id) => id.to_string(),
        };
        EvaluationResult::new(task_id, row.passed.unwrap_or(false))
    }
}

/// Parses result rows from a reader.
///
/// `source` is only used in diagnostics.
pub fn parse_results<R: BufRead>(reader: R, source: &Path) -> Result<LoadedResults, ResultsError> {
    let mut loaded = LoadedResults::default();

    for (index, raw) in reader.split(b'\n').enumerate() {
        let raw = raw.map_err(|e| ResultsError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;
        let line_no = index + 1;
        let line = String::from_utf8_lossy(&raw);
        let trimmed = line.trim();

        if trimmed.is_empty() {
            warn!(file = %source.display(), line = line_no, "Empty line in results file");
            continue;
        }

        match serde_json::from_str::<ResultRow>(trimmed) {
            Ok(row) => loaded.results.push(row.into()),
            Err(e) => {
                loaded.skipped_lines += 1;
                warn!(
                    file = %source.display(),
                    line = line_no,
                    error = %e,
                    content = %preview(trimmed),
                    "Skipping malformed result line"
                );
            }
        }
    }

    debug!(
        file = %source.display(),
        results = loaded.results.len(),
        skipped = loaded.skipped_lines,
        "Parsed results file"
    );

    Ok(loaded)
}

/// Loads a result file from disk.
pub fn load_results(path: &Path) -> Result<LoadedResults, ResultsError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ResultsError::NotFound(path.to_path_buf())
        } else {
            ResultsError::Read {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    parse_results(BufReader::new(file), path)
}

fn preview(line: &str) -> String {
    if line.chars().count() <= LINE_PREVIEW_CHARS {
        line.to_string()
    } else {
        let head: String = line.chars().take(LINE_PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}
