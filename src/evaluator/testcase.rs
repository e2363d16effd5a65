//! Stdin/stdout test-case runner for code-translation candidates.
//!
//! Each translated program is a file in a solutions directory. Its test cases
//! live in a separate directory as input/expected-output pairs named after
//! the program (`p00001.py` -> `p00001_0.in` / `p00001_0.out`). A program
//! passes when its output matches the expected output of every case.
//!
//! Compiled targets set a compile command. The source is then copied into a
//! scratch directory as `<class>.<ext>`, where `<class>` is its public class
//! when it declares one, and compiled there before any case runs. Both
//! templates accept `{file}`, `{dir}` and `{class}`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::process::{run_process, truncate, CommandTemplate};
use super::Evaluator;
use crate::error::EvaluatorError;
use crate::manifest::ManifestEntry;
use crate::scheduler::{run_bounded, BatchSummary};

/// Default interpreter invocation.
pub const DEFAULT_RUN_COMMAND: &str = "python3 {file}";

/// Default per-case timeout.
pub const DEFAULT_CASE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout of the compile step.
pub const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of programs run concurrently.
pub const DEFAULT_TESTCASE_CONCURRENCY: usize = 5;

const INFO_LIMIT: usize = 4000;

fn public_class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*public\s+(?:(?:final|abstract)\s+)*class\s+([A-Za-z_$][A-Za-z0-9_$]*)")
            .expect("Invalid public class regex")
    })
}

/// Name of the first `public class` declared in `source`.
pub fn public_class_name(source: &str) -> Option<String> {
    public_class_pattern()
        .captures(source)
        .map(|caps| caps[1].to_string())
}

/// Configuration for [`TestcaseEvaluator`].
#[derive(Debug, Clone)]
pub struct TestcaseConfig {
    /// Directory searched recursively for test-case files.
    pub testcase_dir: PathBuf,
    /// Extension of solution files, without the dot.
    pub extension: String,
    /// Suffix of input files (`.in` or `_in.txt`).
    pub input_suffix: String,
    /// Suffix of expected-output files (`.out` or `_out.txt`).
    pub output_suffix: String,
    /// Command used to run one solution; `{file}` is the solution path.
    pub run_command: String,
    /// Optional compile step run once per solution before its cases.
    pub compile_command: Option<String>,
    /// Timeout of the compile step.
    pub compile_timeout: Duration,
    /// Timeout for a single test case.
    pub case_timeout: Duration,
    /// Number of solutions evaluated concurrently.
    pub concurrency: usize,
}

impl TestcaseConfig {
    pub fn new(testcase_dir: impl Into<PathBuf>) -> Self {
        Self {
            testcase_dir: testcase_dir.into(),
            extension: "py".to_string(),
            input_suffix: ".in".to_string(),
            output_suffix: ".out".to_string(),
            run_command: DEFAULT_RUN_COMMAND.to_string(),
            compile_command: None,
            compile_timeout: DEFAULT_COMPILE_TIMEOUT,
            case_timeout: DEFAULT_CASE_TIMEOUT,
            concurrency: DEFAULT_TESTCASE_CONCURRENCY,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn with_suffixes(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.input_suffix = input.into();
        self.output_suffix = output.into();
        self
    }

    pub fn with_run_command(mut self, command: impl Into<String>) -> Self {
        self.run_command = command.into();
        self
    }

    pub fn with_compile_command(mut self, command: impl Into<String>) -> Self {
        self.compile_command = Some(command.into());
        self
    }

    pub fn with_compile_timeout(mut self, timeout: Duration) -> Self {
        self.compile_timeout = timeout;
        self
    }

    pub fn with_case_timeout(mut self, timeout: Duration) -> Self {
        self.case_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// One input/expected-output pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub input: PathBuf,
    pub expected: PathBuf,
}

/// Result row for one solution file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionReport {
    pub task_id: String,
    pub passed: bool,
    pub compile_success: bool,
    pub total_test_cases: usize,
    pub passed_test_cases: usize,
    pub compile_info: String,
}

/// Where one solution is run from, and the values its templates see.
struct Workspace {
    file: PathBuf,
    dir: PathBuf,
    class: String,
    // Removed on drop.
    _scratch: Option<TempDir>,
}

impl Workspace {
    fn values(&self) -> HashMap<&'static str, String> {
        let mut values = HashMap::new();
        values.insert("file", self.file.display().to_string());
        values.insert("dir", self.dir.display().to_string());
        values.insert("class", self.class.clone());
        values
    }
}

/// Runs translated programs against their stdin/stdout test cases.
#[derive(Debug, Clone)]
pub struct TestcaseEvaluator {
    config: TestcaseConfig,
    run_template: CommandTemplate,
    compile_template: Option<CommandTemplate>,
}

impl TestcaseEvaluator {
    pub fn new(config: TestcaseConfig) -> Result<Self, EvaluatorError> {
        let run_template = CommandTemplate::parse(&config.run_command)?;
        let compile_template = config
            .compile_command
            .as_deref()
            .map(CommandTemplate::parse)
            .transpose()?;
        Ok(Self {
            config,
            run_template,
            compile_template,
        })
    }

    pub fn config(&self) -> &TestcaseConfig {
        &self.config
    }

    /// Whether `file_name` is an input file of the solution named `base`.
    fn is_input_for(&self, base: &str, file_name: &str) -> bool {
        let suffix = self.config.input_suffix.as_str();
        let Some(rest) = file_name.strip_prefix(base) else {
            return false;
        };
        rest == suffix || ((rest.starts_with('_') || rest.starts_with('.')) && rest.ends_with(suffix))
    }

    /// Lists every input file under the test-case directory.
    async fn collect_inputs(&self) -> Result<Vec<PathBuf>, EvaluatorError> {
        let dir = self.config.testcase_dir.clone();
        let suffix = self.config.input_suffix.clone();
        tokio::task::spawn_blocking(move || scan_inputs(&dir, &suffix))
            .await
            .map_err(|e| EvaluatorError::TaskFailed(e.to_string()))
    }

    /// Test cases of the solution named `base`, sorted by input path.
    pub fn test_cases_for(&self, base: &str, inputs: &[PathBuf]) -> Vec<TestCase> {
        inputs
            .iter()
            .filter(|input| {
                input
                    .file_name()
                    .map(|n| self.is_input_for(base, &n.to_string_lossy()))
                    .unwrap_or(false)
            })
            .map(|input| {
                let name = input
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let stem = &name[..name.len() - self.config.input_suffix.len()];
                let expected = input.with_file_name(format!("{}{}", stem, self.config.output_suffix));
                TestCase {
                    input: input.clone(),
                    expected,
                }
            })
            .collect()
    }

    /// Lists solution files in `dir`, sorted.
    async fn collect_solutions(&self, dir: &Path) -> Result<Vec<PathBuf>, EvaluatorError> {
        let is_dir = fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            return Err(EvaluatorError::MissingInput(dir.to_path_buf()));
        }
        let mut solutions = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let has_extension = path
                .extension()
                .map(|ext| ext.to_string_lossy() == self.config.extension)
                .unwrap_or(false);
            if has_extension && fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false) {
                solutions.push(path);
            }
        }
        solutions.sort();
        Ok(solutions)
    }

    fn uses_class(&self) -> bool {
        let in_template = |t: &CommandTemplate| t.placeholders().iter().any(|p| p == "class");
        in_template(&self.run_template) || self.compile_template.as_ref().is_some_and(in_template)
    }

    /// Decides where `solution` runs from. Compiled targets get a scratch
    /// copy named after their public class.
    async fn prepare(&self, solution: &Path) -> Result<Workspace, String> {
        let stem = solution
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        if self.compile_template.is_none() {
            let dir = match solution.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            return Ok(Workspace {
                file: solution.to_path_buf(),
                dir,
                class: stem,
                _scratch: None,
            });
        }

        let source = fs::read_to_string(solution)
            .await
            .map_err(|e| format!("Cannot read {}: {}", solution.display(), e))?;
        let class = match public_class_name(&source) {
            Some(class) => class,
            None if self.uses_class() => {
                return Err(format!("No public class found in {}. Skipping.", solution.display()))
            }
            None => stem,
        };

        let scratch = TempDir::new().map_err(|e| format!("Cannot create scratch dir: {}", e))?;
        let file = scratch
            .path()
            .join(format!("{}.{}", class, self.config.extension));
        fs::write(&file, &source)
            .await
            .map_err(|e| format!("Cannot copy {}: {}", solution.display(), e))?;

        Ok(Workspace {
            file,
            dir: scratch.path().to_path_buf(),
            class,
            _scratch: Some(scratch),
        })
    }

    /// Runs the compile step; appends diagnostics to `info`.
    async fn compile(
        &self,
        template: &CommandTemplate,
        solution: &Path,
        workspace: &Workspace,
        info: &mut String,
    ) -> bool {
        let argv = match template.render(&workspace.values()) {
            Ok(argv) => argv,
            Err(e) => {
                info.push_str(&format!("{}\n", e));
                return false;
            }
        };
        match run_process(&argv, None, self.config.compile_timeout, solution).await {
            Ok(output) if output.is_success() => {
                info.push_str(&format!("Compiled {} successfully.\n", solution.display()));
                true
            }
            Ok(output) => {
                info.push_str(&format!(
                    "Failed to compile {} (exit code {}).\n{}\n",
                    solution.display(),
                    output.exit_code,
                    output.stderr.trim_end()
                ));
                false
            }
            Err(e) => {
                info.push_str(&format!("Failed to compile {}: {}\n", solution.display(), e));
                false
            }
        }
    }

    /// Runs one solution against its test cases, compiling it first when a
    /// compile command is configured.
    pub async fn evaluate_solution(&self, solution: &Path, cases: &[TestCase]) -> SolutionReport {
        let task_id = solution
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut info = String::new();
        let failed = |compile_success: bool, info: String| SolutionReport {
            task_id: task_id.clone(),
            passed: false,
            compile_success,
            total_test_cases: cases.len(),
            passed_test_cases: 0,
            compile_info: truncate(&info, INFO_LIMIT),
        };

        let workspace = match self.prepare(solution).await {
            Ok(workspace) => workspace,
            Err(reason) => return failed(false, reason),
        };

        if let Some(template) = &self.compile_template {
            if !self.compile(template, solution, &workspace, &mut info).await {
                debug!(task_id = %task_id, "Compilation failed");
                return failed(false, info);
            }
        }

        if cases.is_empty() {
            info.push_str(&format!(
                "No test cases found for {}. Skipping test case validation.\n",
                solution.display()
            ));
            return failed(self.compile_template.is_some(), info);
        }

        let argv = match self.run_template.render(&workspace.values()) {
            Ok(argv) => argv,
            Err(e) => return failed(false, e.to_string()),
        };

        let mut passed_cases = 0usize;
        let mut compile_success = true;

        for case in cases {
            let expected = match fs::read_to_string(&case.expected).await {
                Ok(content) => content,
                Err(_) => {
                    info.push_str(&format!(
                        "Expected output file {} not found. Skipping this test case.\n",
                        case.expected.display()
                    ));
                    continue;
                }
            };
            let stdin = match fs::File::open(&case.input).await {
                Ok(file) => file.into_std().await,
                Err(e) => {
                    info.push_str(&format!("Cannot open {}: {}\n", case.input.display(), e));
                    continue;
                }
            };

            match run_process(&argv, Some(stdin), self.config.case_timeout, solution).await {
                Ok(output) => {
                    if !output.stdout.is_empty() {
                        info.push_str(&output.stdout);
                        info.push('\n');
                    }
                    if !output.stderr.is_empty() {
                        info.push_str(&output.stderr);
                        info.push('\n');
                    }
                    if output_matches(&output.stdout, &expected) {
                        passed_cases += 1;
                        info.push_str(&format!(
                            "Ran with test case {} and passed.\n",
                            case.input.display()
                        ));
                    } else {
                        info.push_str(&format!(
                            "Ran with test case {} but failed (exit code {}).\n",
                            case.input.display(),
                            output.exit_code
                        ));
                    }
                }
                Err(EvaluatorError::Timeout { timeout, .. }) => {
                    info.push_str(&format!(
                        "Test case {} timed out after {:?}.\n",
                        case.input.display(),
                        timeout
                    ));
                }
                Err(e) => {
                    compile_success = false;
                    info.push_str(&format!(
                        "Failed to run with test case {}: {}\n",
                        case.input.display(),
                        e
                    ));
                }
            }
        }

        debug!(
            task_id = %task_id,
            passed = passed_cases,
            total = cases.len(),
            "Solution evaluated"
        );

        SolutionReport {
            passed: passed_cases == cases.len(),
            task_id,
            compile_success,
            total_test_cases: cases.len(),
            passed_test_cases: passed_cases,
            compile_info: truncate(&info, INFO_LIMIT),
        }
    }

    /// Evaluates every solution in `dir`, returning reports sorted by task id.
    pub async fn run_directory(&self, dir: &Path) -> Result<Vec<SolutionReport>, EvaluatorError> {
        let solutions = self.collect_solutions(dir).await?;
        if solutions.is_empty() {
            return Err(EvaluatorError::NoSolutions {
                dir: dir.to_path_buf(),
                extension: self.config.extension.clone(),
            });
        }

        let inputs = Arc::new(self.collect_inputs().await?);
        info!(
            dir = %dir.display(),
            solutions = solutions.len(),
            inputs = inputs.len(),
            "Running test cases"
        );

        let outcomes = run_bounded(solutions, self.config.concurrency, |solution| {
            let inputs = inputs.clone();
            async move {
                let base = solution
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let cases = self.test_cases_for(&base, &inputs);
                Ok::<_, EvaluatorError>(self.evaluate_solution(&solution, &cases).await)
            }
        })
        .await;

        let summary = BatchSummary::of(&outcomes);
        let mut reports: Vec<SolutionReport> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome.result {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(file = %outcome.key.display(), error = %e, "Solution evaluation failed");
                    None
                }
            })
            .collect();
        reports.sort_by(|a, b| a.task_id.cmp(&b.task_id));

        let passed = reports.iter().filter(|r| r.passed).count();
        info!(
            dir = %dir.display(),
            evaluated = summary.succeeded,
            passed,
            "Test-case run finished"
        );
        Ok(reports)
    }
}

/// Lists files under `dir`, recursively, whose name ends with `suffix`.
fn scan_inputs(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut inputs: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
        .map(|e| e.into_path())
        .collect();
    inputs.sort();
    inputs
}

/// Compares program output with expected output line by line, ignoring
/// surrounding whitespace of the whole output and trailing whitespace of each
/// line.
pub fn output_matches(actual: &str, expected: &str) -> bool {
    let actual: Vec<&str> = actual.trim().split('\n').map(str::trim_end).collect();
    let expected: Vec<&str> = expected.trim().split('\n').map(str::trim_end).collect();
    actual == expected
}

/// Writes reports as newline-delimited JSON, creating parent directories.
pub async fn write_reports(reports: &[SolutionReport], path: &Path) -> Result<(), EvaluatorError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let mut body = String::new();
    for report in reports {
        body.push_str(&serde_json::to_string(report)?);
        body.push('\n');
    }
    fs::write(path, body).await?;
    Ok(())
}

#[async_trait]
impl Evaluator for TestcaseEvaluator {
    fn name(&self) -> &str {
        "testcase"
    }

    /// Treats the entry's completions path as a directory of solutions.
    async fn evaluate(&self, entry: &ManifestEntry) -> Result<PathBuf, EvaluatorError> {
        let reports = self.run_directory(&entry.completions).await?;
        let path = entry.results_path();
        write_reports(&reports, &path).await?;
        Ok(path)
    }
}
