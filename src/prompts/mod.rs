//! Projection of winning prompts out of a prompt-definition file.
//!
//! Prompt definitions are newline-delimited JSON records carrying a
//! `prompt_id`. Matching records are copied byte for byte, so field order and
//! any extra fields survive.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::PromptError;
use crate::results::PromptId;

#[derive(Deserialize)]
struct PromptHeader {
    prompt_id: PromptId,
}

/// Copies every record of `prompts_path` whose `prompt_id` is in `winners` to
/// `output`, in file order. Returns the number of records written.
///
/// Nothing is written, and `output` is not created, when `winners` is empty.
pub fn extract_prompts(
    prompts_path: &Path,
    winners: &[PromptId],
    output: &Path,
) -> Result<usize, PromptError> {
    if winners.is_empty() {
        warn!(file = %prompts_path.display(), "No winners to extract");
        return Ok(0);
    }
    if !prompts_path.exists() {
        return Err(PromptError::NotFound(prompts_path.to_path_buf()));
    }

    let wanted: HashSet<&PromptId> = winners.iter().collect();
    let reader = BufReader::new(File::open(prompts_path)?);
    let mut selected = Vec::new();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        let record = line.trim();
        if record.is_empty() {
            continue;
        }
        match serde_json::from_str::<PromptHeader>(record) {
            Ok(header) if wanted.contains(&header.prompt_id) => selected.push(record.to_string()),
            Ok(_) => {}
            Err(e) => warn!(
                file = %prompts_path.display(),
                line = index + 1,
                error = %e,
                "Skipping malformed prompt record"
            ),
        }
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(output)?);
    for record in &selected {
        writeln!(writer, "{}", record)?;
    }
    writer.flush()?;

    let found: HashSet<PromptId> = selected
        .iter()
        .filter_map(|r| serde_json::from_str::<PromptHeader>(r).ok())
        .map(|h| h.prompt_id)
        .collect();
    for id in winners.iter().filter(|id| !found.contains(*id)) {
        warn!(prompt_id = %id, "Winner has no prompt definition");
    }
    info!(
        written = selected.len(),
        winners = winners.len(),
        output = %output.display(),
        "Extracted best prompts"
    );
    Ok(selected.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROMPTS: &str = concat!(
        "{\"prompt_id\": 2, \"zeta\": 1, \"prompt\": \"Write it twice\"}\n",
        "{\"prompt_id\": 1, \"prompt\": \"Think step by step\"}\n",
        "not json at all\n",
        "\n",
        "{\"prompt_id\": \"seed\", \"prompt\": \"Original\"}\n",
        "{\"prompt_id\": 3, \"prompt\": \"Be brief\"}\n",
    );

    fn prompts_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("prompts.jsonl");
        fs::write(&path, PROMPTS).unwrap();
        path
    }

    #[test]
    fn test_extracts_all_tied_winners_in_file_order() {
        let dir = TempDir::new().unwrap();
        let source = prompts_file(&dir);
        let output = dir.path().join("best").join("best_prompts.jsonl");

        let written = extract_prompts(
            &source,
            &[PromptId::Int(3), PromptId::Int(2), PromptId::from("seed")],
            &output,
        )
        .unwrap();
        assert_eq!(written, 3);

        let content = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        // Copied verbatim, so the original key order is kept.
        assert_eq!(lines[0], "{\"prompt_id\": 2, \"zeta\": 1, \"prompt\": \"Write it twice\"}");
        assert!(lines[1].contains("\"seed\""));
        assert!(lines[2].contains("Be brief"));
    }

    #[test]
    fn test_integer_and_string_ids_differ() {
        let dir = TempDir::new().unwrap();
        let source = prompts_file(&dir);
        let output = dir.path().join("out.jsonl");

        let written = extract_prompts(&source, &[PromptId::from("1")], &output).unwrap();
        assert_eq!(written, 0);
        assert_eq!(fs::read_to_string(&output).unwrap(), "");
    }

    #[test]
    fn test_no_winners_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let source = prompts_file(&dir);
        let output = dir.path().join("out.jsonl");

        assert_eq!(extract_prompts(&source, &[], &output).unwrap(), 0);
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_prompt_file() {
        let dir = TempDir::new().unwrap();
        let err = extract_prompts(
            &dir.path().join("absent.jsonl"),
            &[PromptId::Int(1)],
            &dir.path().join("out.jsonl"),
        )
        .unwrap_err();
        assert!(matches!(err, PromptError::NotFound(_)));
    }
}
