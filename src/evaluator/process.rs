//! Subprocess plumbing shared by the evaluators.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

use crate::error::EvaluatorError;

/// A command line with `{placeholder}` slots.
///
/// The template is split on whitespace *before* substitution, so a
/// substituted path containing spaces stays one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    parts: Vec<String>,
}

impl CommandTemplate {
    pub fn parse(template: &str) -> Result<Self, EvaluatorError> {
        let parts: Vec<String> = template.split_whitespace().map(String::from).collect();
        if parts.is_empty() {
            return Err(EvaluatorError::InvalidTemplate(
                "command template is empty".to_string(),
            ));
        }
        Ok(Self { parts })
    }

    /// Names of the `{placeholders}` used by the template.
    pub fn placeholders(&self) -> Vec<String> {
        let mut names = Vec::new();
        for part in &self.parts {
            let mut rest = part.as_str();
            while let Some(start) = rest.find('{') {
                let after = &rest[start + 1..];
                match after.find('}') {
                    Some(end) => {
                        names.push(after[..end].to_string());
                        rest = &after[end + 1..];
                    }
                    None => break,
                }
            }
        }
        names
    }

    /// Substitutes placeholders; every placeholder must have a value.
    pub fn render(&self, values: &HashMap<&str, String>) -> Result<Vec<String>, EvaluatorError> {
        for name in self.placeholders() {
            if !values.contains_key(name.as_str()) {
                return Err(EvaluatorError::InvalidTemplate(format!(
                    "no value for placeholder {{{}}}",
                    name
                )));
            }
        }

        Ok(self.parts.iter().map(|part| substitute(part, values)).collect())
    }
}

/// Replaces each `{name}` slot of `part` in one left-to-right pass.
/// Substituted text is never scanned again.
fn substitute(part: &str, values: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(part.len());
    let mut rest = part;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match values.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

impl std::fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.parts.join(" "))
    }
}

/// Captured output of a finished subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs `argv` with an optional stdin file and a hard timeout.
///
/// The child is killed when the timeout fires. `subject` names the file being
/// evaluated in the timeout error.
pub async fn run_process(
    argv: &[String],
    stdin: Option<File>,
    timeout: Duration,
    subject: &Path,
) -> Result<ProcessOutput, EvaluatorError> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        EvaluatorError::InvalidTemplate("command line is empty".to_string())
    })?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    match stdin {
        Some(file) => cmd.stdin(Stdio::from(file)),
        None => cmd.stdin(Stdio::null()),
    };

    let start = Instant::now();
    let child = cmd.spawn().map_err(|e| EvaluatorError::SpawnFailed {
        command: program.clone(),
        reason: e.to_string(),
    })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let result = ProcessOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                duration: start.elapsed(),
            };
            debug!(
                command = %program,
                exit_code = result.exit_code,
                duration_ms = result.duration.as_millis() as u64,
                "Process finished"
            );
            Ok(result)
        }
        Ok(Err(e)) => Err(EvaluatorError::SpawnFailed {
            command: program.clone(),
            reason: format!("process error: {}", e),
        }),
        // Dropping the wait future drops the child, which kills it.
        Err(_) => Err(EvaluatorError::Timeout {
            file: subject.to_path_buf(),
            timeout,
        }),
    }
}

/// Shortens long process output for logs and result rows.
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}... [truncated]", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_template_render() {
        let template = CommandTemplate::parse(
            "evaluate_functional_correctness {sample_file} --problem_file={problem_file}",
        )
        .unwrap();
        assert_eq!(
            template.placeholders(),
            vec!["sample_file".to_string(), "problem_file".to_string()]
        );

        let argv = template
            .render(&values(&[
                ("sample_file", "/runs/my samples_1.jsonl"),
                ("problem_file", "/data/train.jsonl"),
            ]))
            .unwrap();
        assert_eq!(
            argv,
            vec![
                "evaluate_functional_correctness".to_string(),
                "/runs/my samples_1.jsonl".to_string(),
                "--problem_file=/data/train.jsonl".to_string(),
            ]
        );
    }

    #[test]
    fn test_substituted_values_are_not_expanded_again() {
        let template = CommandTemplate::parse("javac -d {dir} {file}").unwrap();
        let argv = template
            .render(&values(&[("file", "/src/{dir}/Main.java"), ("dir", "/out/{file}")]))
            .unwrap();
        assert_eq!(
            argv,
            vec![
                "javac".to_string(),
                "-d".to_string(),
                "/out/{file}".to_string(),
                "/src/{dir}/Main.java".to_string(),
            ]
        );
    }

    #[test]
    fn test_template_missing_value() {
        let template = CommandTemplate::parse("python3 {file}").unwrap();
        let err = template.render(&HashMap::new()).unwrap_err();
        assert!(matches!(err, EvaluatorError::InvalidTemplate(_)));
    }

    #[test]
    fn test_empty_template_rejected() {
        assert!(CommandTemplate::parse("   ").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd... [truncated]");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_process_captures_output() {
        let argv = vec!["sh".to_string(), "-c".to_string(), "echo out; echo err >&2; exit 3".to_string()];
        let output = run_process(&argv, None, Duration::from_secs(10), Path::new("x"))
            .await
            .unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(!output.is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_process_timeout() {
        let argv = vec!["sleep".to_string(), "5".to_string()];
        let err = run_process(&argv, None, Duration::from_millis(100), Path::new("slow.py"))
            .await
            .unwrap_err();
        assert!(matches!(err, EvaluatorError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_run_process_spawn_failure() {
        let argv = vec!["definitely-not-a-real-binary-xyz".to_string()];
        let err = run_process(&argv, None, Duration::from_secs(1), Path::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, EvaluatorError::SpawnFailed { .. }));
    }
}
