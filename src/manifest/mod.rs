//! Candidate-set manifests.
//!
//! A manifest maps each prompt id to the file holding that prompt variant's
//! generated completions and to the file holding its evaluation results.
//! Older runs encoded the prompt id in the completion filename
//! (`train_set_gpt-4o-mini_3.jsonl`); [`Manifest::discover`] turns such a
//! directory into a manifest so the id is parsed exactly once.
//!
//! On disk:
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": [
//!     { "prompt_id": 0, "completions": "samples_0.jsonl" },
//!     { "prompt_id": 1, "completions": "samples_1.jsonl", "results": "eval/1.jsonl" }
//!   ]
//! }
//! ```
//!
//! Relative paths are resolved against the manifest's directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ManifestError;
use crate::results::PromptId;

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Suffix appended to a completion file's name to get its results file.
pub const RESULTS_SUFFIX: &str = "_results.jsonl";

const COMPLETIONS_EXTENSION: &str = ".jsonl";

fn prompt_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_(\d+)\.jsonl$").expect("Invalid prompt id regex"))
}

/// Results path used when an entry does not name one:
/// `<completions file name>_results.jsonl` next to the completions file.
pub fn default_results_path(completions: &Path) -> PathBuf {
    let mut name = completions
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(RESULTS_SUFFIX);
    completions.with_file_name(name)
}

/// Extracts the integer prompt id from a legacy completion file name.
pub fn prompt_id_from_filename(file_name: &str) -> Option<i64> {
    prompt_id_pattern()
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// One candidate set in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub prompt_id: PromptId,
    /// Generated completions for this prompt variant.
    pub completions: PathBuf,
    /// Evaluation results; defaults to [`default_results_path`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<PathBuf>,
}

impl ManifestEntry {
    pub fn new(prompt_id: PromptId, completions: impl Into<PathBuf>) -> Self {
        Self {
            prompt_id,
            completions: completions.into(),
            results: None,
        }
    }

    pub fn with_results(mut self, results: impl Into<PathBuf>) -> Self {
        self.results = Some(results.into());
        self
    }

    /// Where this entry's evaluation results live.
    pub fn results_path(&self) -> PathBuf {
        self.results
            .clone()
            .unwrap_or_else(|| default_results_path(&self.completions))
    }

    fn resolve_against(&mut self, base: &Path) {
        if self.completions.is_relative() {
            self.completions = base.join(&self.completions);
        }
        if let Some(results) = &self.results {
            if results.is_relative() {
                self.results = Some(base.join(results));
            }
        }
    }
}

/// Index of candidate sets for one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub entries: Vec<ManifestEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: Vec::new(),
        }
    }
}

impl Manifest {
    /// Builds a manifest, rejecting duplicate prompt ids.
    pub fn new(entries: Vec<ManifestEntry>) -> Result<Self, ManifestError> {
        let manifest = Self {
            version: MANIFEST_VERSION,
            entries,
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reads a manifest file and resolves relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut manifest: Manifest = serde_json::from_str(&content)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion(manifest.version));
        }

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for entry in &mut manifest.entries {
            entry.resolve_against(base);
        }
        manifest.validate()?;

        debug!(path = %path.display(), entries = manifest.entries.len(), "Loaded manifest");
        Ok(manifest)
    }

    /// Writes the manifest as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), entries = self.entries.len(), "Saved manifest");
        Ok(())
    }

    /// Builds a manifest from a directory of `..._<id>.jsonl` completion files.
    ///
    /// `_results.jsonl` files are ignored, as are files whose name carries no
    /// integer id. Entries are sorted by prompt id and use absolute paths.
    pub fn discover(dir: &Path) -> Result<Self, ManifestError> {
        if !dir.is_dir() {
            return Err(ManifestError::MissingDirectory(dir.to_path_buf()));
        }
        let dir = dir.canonicalize()?;

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&dir)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }
            let file_name = dir_entry.file_name().to_string_lossy().to_string();
            if !file_name.ends_with(COMPLETIONS_EXTENSION) || file_name.ends_with(RESULTS_SUFFIX) {
                continue;
            }

            match prompt_id_from_filename(&file_name) {
                Some(id) => entries.push(ManifestEntry::new(PromptId::Int(id), dir_entry.path())),
                None => warn!(file = %file_name, "Cannot extract prompt_id from filename, skipping"),
            }
        }

        entries.sort_by(|a, b| a.prompt_id.cmp(&b.prompt_id));
        info!(dir = %dir.display(), entries = entries.len(), "Discovered candidate sets");
        Self::new(entries)
    }

    /// Builds a manifest from a directory holding one subdirectory of
    /// translated programs per prompt variant; the subdirectory name is the
    /// prompt id. Results default to `<subdir>_results.jsonl` beside it.
    pub fn discover_dirs(dir: &Path) -> Result<Self, ManifestError> {
        if !dir.is_dir() {
            return Err(ManifestError::MissingDirectory(dir.to_path_buf()));
        }
        let dir = dir.canonicalize()?;

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&dir)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_dir() {
                continue;
            }
            let name = dir_entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let prompt_id = match name.parse::<i64>() {
                Ok(id) => PromptId::Int(id),
                Err(_) => PromptId::Text(name),
            };
            entries.push(ManifestEntry::new(prompt_id, dir_entry.path()));
        }

        entries.sort_by(|a, b| a.prompt_id.cmp(&b.prompt_id));
        info!(dir = %dir.display(), entries = entries.len(), "Discovered candidate directories");
        Self::new(entries)
    }

    /// Checks that every prompt id appears once.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen: HashMap<&PromptId, &Path> = HashMap::new();
        for entry in &self.entries {
            if let Some(first) = seen.insert(&entry.prompt_id, &entry.completions) {
                return Err(ManifestError::DuplicatePromptId {
                    prompt_id: entry.prompt_id.to_string(),
                    first: first.to_path_buf(),
                    second: entry.completions.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    pub fn get(&self, prompt_id: &PromptId) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| &e.prompt_id == prompt_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn test_prompt_id_from_filename() {
        assert_eq!(prompt_id_from_filename("train_set_gpt-4o-mini_3.jsonl"), Some(3));
        assert_eq!(prompt_id_from_filename("samples_12.jsonl"), Some(12));
        assert_eq!(prompt_id_from_filename("samples.jsonl"), None);
        assert_eq!(prompt_id_from_filename("samples_3.json"), None);
        assert_eq!(prompt_id_from_filename("samples_x.jsonl"), None);
    }

    #[test]
    fn test_default_results_path() {
        assert_eq!(
            default_results_path(Path::new("/runs/samples_3.jsonl")),
            PathBuf::from("/runs/samples_3.jsonl_results.jsonl")
        );
    }

    #[test]
    fn test_entry_results_path_override() {
        let entry = ManifestEntry::new(PromptId::Int(1), "a_1.jsonl").with_results("custom.jsonl");
        assert_eq!(entry.results_path(), PathBuf::from("custom.jsonl"));
    }

    #[test]
    fn test_discover_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "train_set_gpt_10.jsonl");
        touch(dir.path(), "train_set_gpt_2.jsonl");
        touch(dir.path(), "train_set_gpt_2.jsonl_results.jsonl");
        touch(dir.path(), "notes.jsonl");
        touch(dir.path(), "readme.txt");
        fs::create_dir(dir.path().join("nested_5.jsonl")).unwrap();

        let manifest = Manifest::discover(dir.path()).unwrap();
        let ids: Vec<_> = manifest.iter().map(|e| e.prompt_id.clone()).collect();
        assert_eq!(ids, vec![PromptId::Int(2), PromptId::Int(10)]);

        let first = &manifest.entries[0];
        assert!(first.completions.is_absolute());
        assert!(first.results_path().exists());
    }

    #[test]
    fn test_discover_dirs() {
        let dir = TempDir::new().unwrap();
        for name in ["10", "2", "seed", ".cache"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        touch(dir.path(), "2_results.jsonl");

        let manifest = Manifest::discover_dirs(dir.path()).unwrap();
        let ids: Vec<_> = manifest.iter().map(|e| e.prompt_id.clone()).collect();
        assert_eq!(
            ids,
            vec![PromptId::Int(2), PromptId::Int(10), PromptId::from("seed")]
        );
        assert!(manifest.entries[0].results_path().exists());
        assert!(manifest.entries[0].completions.is_dir());
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::discover(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ManifestError::MissingDirectory(_)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Manifest::new(vec![
            ManifestEntry::new(PromptId::Int(1), "a_1.jsonl"),
            ManifestEntry::new(PromptId::Int(1), "b_1.jsonl"),
        ])
        .unwrap_err();
        assert!(matches!(err, ManifestError::DuplicatePromptId { .. }));
    }

    #[test]
    fn test_save_and_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::new(vec![
            ManifestEntry::new(PromptId::Int(0), "samples_0.jsonl"),
            ManifestEntry::new(PromptId::from("seed"), "/abs/seed.jsonl")
                .with_results("eval/seed.jsonl"),
        ])
        .unwrap();

        let path = dir.path().join("runs").join("manifest.json");
        manifest.save(&path).unwrap();
        let loaded = Manifest::load(&path).unwrap();

        let base = dir.path().join("runs");
        assert_eq!(loaded.entries[0].completions, base.join("samples_0.jsonl"));
        assert_eq!(loaded.entries[1].completions, PathBuf::from("/abs/seed.jsonl"));
        assert_eq!(
            loaded.entries[1].results_path(),
            base.join("eval/seed.jsonl")
        );
        assert!(loaded.get(&PromptId::from("seed")).is_some());
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, r#"{"version": 7, "entries": []}"#).unwrap();
        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedVersion(7)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(_)));
    }
}
