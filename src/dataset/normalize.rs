//! In-place clean-up of generated training sets.

use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::info;

use super::read_records;
use crate::error::DatasetError;

/// Fields whose literal escape sequences are unescaped.
pub const TEXT_FIELDS: [&str; 3] = ["prompt", "canonical_solution", "test"];

/// Replaces literal `\\`, `\n`, `\t` and `\"` sequences, in that order.
pub fn clean_escapes(text: &str) -> String {
    text.replace("\\\\", "\\")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\\"", "\"")
}

/// Rewrites a training set in place: task ids become `auto/<index>` and the
/// text fields are unescaped. Returns the number of records.
pub fn normalize_tasks(path: &Path) -> Result<usize, DatasetError> {
    let records = read_records(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let count = records.len();
    // Same directory as the target so the rename stays on one filesystem.
    let mut tmp = NamedTempFile::new_in(dir)?;
    for (index, (_, mut record)) in records.into_iter().enumerate() {
        record.insert("task_id".to_string(), Value::String(format!("auto/{}", index)));
        for field in TEXT_FIELDS {
            if let Some(Value::String(text)) = record.get_mut(field) {
                *text = clean_escapes(text);
            }
        }
        writeln!(tmp, "{}", serde_json::to_string(&record)?)?;
    }
    tmp.flush()?;
    tmp.persist(path).map_err(|e| DatasetError::Io(e.error))?;

    info!(file = %path.display(), records = count, "Normalized training set");
    Ok(count)
}
