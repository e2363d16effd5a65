//! CLI command definitions for prompt-forge.
//!
//! Each subcommand maps to one step of the prompt-optimization loop: scoring
//! candidate sets, building manifests, projecting the winning prompts,
//! running test cases and preparing datasets.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use crate::dataset::{merge_completions, normalize_tasks, sample_lines};
use crate::evaluator::{write_reports, Evaluator, TestcaseEvaluator};
use crate::manifest::{default_results_path, Manifest};
use crate::pipeline::{ForgeConfig, ScoringPipeline, ScoringRun};
use crate::prompts::extract_prompts;
use crate::results::PromptId;

/// Default output file for the winning prompts.
const DEFAULT_BEST_PROMPTS: &str = "best_prompts.jsonl";

/// Default output file for `manifest`.
const DEFAULT_MANIFEST: &str = "manifest.json";

/// Weighted pass-rate scoring and best-prompt selection.
#[derive(Parser)]
#[command(name = "prompt-forge")]
#[command(about = "Score prompt variants by weighted pass rate and keep the best")]
#[command(version)]
#[command(
    long_about = "prompt-forge scores candidate sets of generated code, one per prompt variant.\n\nTasks that few variants solve weigh more, so a variant wins by solving hard tasks, not only many easy ones. All variants tied for the best weighted score are kept.\n\nExample usage:\n  prompt-forge score --dir ./runs/gen-3 --problem-file train.jsonl --prompts prompts.jsonl"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// YAML configuration file; FORGE_* environment variables override it.
    #[arg(long, env = "FORGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Score candidate sets and select the best prompt(s).
    ///
    /// Missing results files are produced by the evaluator first, unless
    /// --no-evaluate is given.
    #[command(alias = "select")]
    Score(ScoreArgs),

    /// Build a manifest from a directory of `..._<id>.jsonl` completion files.
    Manifest(ManifestArgs),

    /// Copy the definitions of the given prompt ids out of a prompt file.
    Extract(ExtractArgs),

    /// Run translated programs against stdin/stdout test cases.
    #[command(alias = "tc")]
    Testcases(TestcasesArgs),

    /// Randomly sample lines of a JSONL training set.
    Sample(SampleArgs),

    /// Fill empty completions from a second generation run.
    Merge(MergeArgs),

    /// Renumber task ids and unescape text fields of a training set in place.
    Normalize(NormalizeArgs),
}

/// Arguments for `prompt-forge score`.
#[derive(Parser, Debug)]
pub struct ScoreArgs {
    /// Manifest listing the candidate sets.
    #[arg(long, conflicts_with = "dir", required_unless_present = "dir")]
    pub manifest: Option<PathBuf>,

    /// Directory of candidate sets, discovered from file names (or
    /// subdirectory names with --testcases).
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Reference problem set passed to the evaluator.
    #[arg(long)]
    pub problem_file: Option<PathBuf>,

    /// Evaluator command template ({sample_file}, {problem_file}).
    #[arg(long)]
    pub evaluate_command: Option<String>,

    /// Evaluate with the test-case runner using this test-case directory.
    #[arg(long)]
    pub testcases: Option<PathBuf>,

    /// Prompt-definition file to extract the winners from.
    #[arg(short, long)]
    pub prompts: Option<PathBuf>,

    /// Output file for the winning prompt definitions.
    #[arg(long, default_value = DEFAULT_BEST_PROMPTS)]
    pub best_prompts: PathBuf,

    /// Write the full run report as JSON to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Never run the evaluator; sets without results are skipped.
    #[arg(long)]
    pub no_evaluate: bool,

    /// Maximum number of concurrent evaluations.
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Attempts per evaluation (0 retries until success).
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Output JSON summary.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `prompt-forge manifest`.
#[derive(Parser, Debug)]
pub struct ManifestArgs {
    /// Directory of completion files.
    #[arg(short, long)]
    pub dir: PathBuf,

    /// Discover one subdirectory per prompt instead of one file per prompt.
    #[arg(long)]
    pub dirs: bool,

    /// Output manifest file.
    #[arg(short, long, default_value = DEFAULT_MANIFEST)]
    pub output: PathBuf,
}

/// Arguments for `prompt-forge extract`.
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Prompt-definition file (JSONL with prompt_id).
    #[arg(short, long)]
    pub prompts: PathBuf,

    /// Comma-separated prompt ids to keep. Integer-looking ids are integers.
    #[arg(
        long,
        value_delimiter = ',',
        value_parser = parse_prompt_id,
        required_unless_present = "from_report"
    )]
    pub ids: Vec<PromptId>,

    /// Take the winners from a report written by `score --report`.
    #[arg(long, conflicts_with = "ids")]
    pub from_report: Option<PathBuf>,

    /// Output file.
    #[arg(short, long, default_value = DEFAULT_BEST_PROMPTS)]
    pub output: PathBuf,
}

/// Parses one `--ids` value with the integer-aware `FromStr`.
fn parse_prompt_id(value: &str) -> Result<PromptId, String> {
    value.parse::<PromptId>().map_err(|e| e.to_string())
}

/// Arguments for `prompt-forge testcases`.
#[derive(Parser, Debug)]
pub struct TestcasesArgs {
    /// Directory of translated programs.
    #[arg(short, long)]
    pub solutions: PathBuf,

    /// Directory searched recursively for test-case files.
    #[arg(short, long)]
    pub testcases: PathBuf,

    /// Results file (default: `<solutions>_results.jsonl`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Extension of solution files.
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Command used to run one program ({file} is the program path).
    #[arg(long)]
    pub run: Option<String>,

    /// Compile step run before each program's cases ({file}, {dir}, {class}).
    #[arg(long)]
    pub compile: Option<String>,

    /// Suffix of test-case input files.
    #[arg(long)]
    pub input_suffix: Option<String>,

    /// Suffix of expected-output files.
    #[arg(long)]
    pub output_suffix: Option<String>,

    /// Per-case timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum number of programs run concurrently.
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Output JSON summary.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `prompt-forge sample`.
#[derive(Parser, Debug)]
pub struct SampleArgs {
    /// Input JSONL file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output JSONL file.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of lines to keep.
    #[arg(short = 'n', long, default_value = "10")]
    pub size: usize,

    /// Random seed for a reproducible sample.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for `prompt-forge merge`.
#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// File whose empty completions are filled.
    #[arg(long)]
    pub primary: PathBuf,

    /// File providing the replacement completions.
    #[arg(long)]
    pub fallback: PathBuf,

    /// Output file.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output JSON summary.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `prompt-forge normalize`.
#[derive(Parser, Debug)]
pub struct NormalizeArgs {
    /// Training set rewritten in place.
    #[arg(short, long)]
    pub file: PathBuf,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = ForgeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Score(args) => run_score_command(args, config).await,
        Commands::Manifest(args) => run_manifest_command(args),
        Commands::Extract(args) => run_extract_command(args),
        Commands::Testcases(args) => run_testcases_command(args, config).await,
        Commands::Sample(args) => run_sample_command(args),
        Commands::Merge(args) => run_merge_command(args),
        Commands::Normalize(args) => run_normalize_command(args),
    }
}

// ============================================================================
// Score Command Implementation
// ============================================================================

#[derive(Debug, Serialize)]
struct ScoreOutput<'a> {
    #[serde(flatten)]
    run: &'a ScoringRun,
    best_prompts: Option<PathBuf>,
    prompts_written: usize,
}

fn apply_score_overrides(args: &ScoreArgs, mut config: ForgeConfig) -> anyhow::Result<ForgeConfig> {
    if let Some(problem_file) = &args.problem_file {
        config = config.with_problem_file(problem_file);
    }
    if let Some(command) = &args.evaluate_command {
        config = config.with_evaluate_command(command.clone());
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(attempts) = args.max_attempts {
        config = config.with_max_attempts(attempts);
    }
    if args.no_evaluate {
        config = config.with_evaluate(false);
    }
    config.validate()?;
    Ok(config)
}

/// Picks the evaluator for missing results, if one can run.
fn build_evaluator(args: &ScoreArgs, config: &ForgeConfig) -> anyhow::Result<Option<Arc<dyn Evaluator>>> {
    if !config.evaluate {
        return Ok(None);
    }
    if let Some(testcases) = &args.testcases {
        let evaluator = TestcaseEvaluator::new(config.testcase_config(testcases))?;
        return Ok(Some(Arc::new(evaluator)));
    }

    let evaluator = config.command_evaluator()?;
    let needs_problem_file = evaluator
        .template()
        .placeholders()
        .iter()
        .any(|p| p == "problem_file");
    if needs_problem_file && config.problem_file.is_none() {
        warn!("No problem file configured; sets without results will be skipped");
        return Ok(None);
    }
    Ok(Some(Arc::new(evaluator)))
}

fn load_manifest(args: &ScoreArgs) -> anyhow::Result<Manifest> {
    match (&args.manifest, &args.dir) {
        (Some(path), _) => Manifest::load(path)
            .with_context(|| format!("Failed to load manifest {}", path.display())),
        (None, Some(dir)) if args.testcases.is_some() => Manifest::discover_dirs(dir)
            .with_context(|| format!("Failed to discover candidate directories in {}", dir.display())),
        (None, Some(dir)) => Manifest::discover(dir)
            .with_context(|| format!("Failed to discover candidate sets in {}", dir.display())),
        (None, None) => Err(anyhow::anyhow!("Either --manifest or --dir is required")),
    }
}

async fn run_score_command(args: ScoreArgs, config: ForgeConfig) -> anyhow::Result<()> {
    let config = apply_score_overrides(&args, config)?;
    let manifest = load_manifest(&args)?;
    let evaluator = build_evaluator(&args, &config)?;

    let mut pipeline = ScoringPipeline::new(config);
    if let Some(evaluator) = evaluator {
        pipeline = pipeline.with_evaluator(evaluator);
    }
    let run = pipeline.run(&manifest).await?;

    if let Some(report) = &args.report {
        run.write_json(report)
            .with_context(|| format!("Failed to write report {}", report.display()))?;
        info!(report = %report.display(), "Wrote scoring report");
    }

    let prompts_written = match &args.prompts {
        Some(prompts) => extract_prompts(prompts, &run.winners, &args.best_prompts)
            .with_context(|| format!("Failed to extract prompts from {}", prompts.display()))?,
        None => 0,
    };

    if args.json {
        let output = ScoreOutput {
            run: &run,
            best_prompts: args.prompts.as_ref().map(|_| args.best_prompts.clone()),
            prompts_written,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_scoring_run(&run);
    if args.prompts.is_some() {
        println!(
            "Best prompts:   {} written to {}",
            prompts_written,
            args.best_prompts.display()
        );
    }
    Ok(())
}

fn print_scoring_run(run: &ScoringRun) {
    println!("\n=== Scoring Results ===");
    println!("Run:            {}", run.run_id);
    println!("Scored sets:    {}", run.records.len());
    println!("Skipped sets:   {}", run.skipped.len());
    println!("Evaluated:      {}", run.evaluated);
    println!("Skipped lines:  {}", run.skipped_lines);
    println!();
    println!("{:<12} {:>10} {:>10} {:>12}", "prompt_id", "passed", "pass rate", "weighted");
    for record in &run.records {
        let marker = if run.winners.contains(&record.prompt_id) { " *" } else { "" };
        println!(
            "{:<12} {:>10} {:>9.2}% {:>12.4}{}",
            record.prompt_id.to_string(),
            format!("{}/{}", record.score.passed, record.score.total),
            record.score.original_score * 100.0,
            record.score.weighted_score,
            marker
        );
    }
    for skipped in &run.skipped {
        println!("{:<12} skipped: {}", skipped.prompt_id.to_string(), skipped.reason);
    }
    println!();

    let winners: Vec<String> = run.winners.iter().map(|id| id.to_string()).collect();
    println!(
        "Best prompt_id(s) with weighted score {:.4}: {}",
        run.max_weighted_score.unwrap_or(0.0),
        winners.join(", ")
    );
}

// ============================================================================
// Manifest / Extract Commands
// ============================================================================

fn run_manifest_command(args: ManifestArgs) -> anyhow::Result<()> {
    let manifest = if args.dirs {
        Manifest::discover_dirs(&args.dir)?
    } else {
        Manifest::discover(&args.dir)?
    };
    manifest
        .save(&args.output)
        .with_context(|| format!("Failed to write manifest {}", args.output.display()))?;

    println!("✓ Manifest written");
    println!("  Entries: {}", manifest.len());
    println!("  Output:  {}", args.output.display());
    Ok(())
}

fn winners_from_report(path: &Path) -> anyhow::Result<Vec<PromptId>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    let run: ScoringRun = serde_json::from_str(&content)
        .with_context(|| format!("Invalid report {}", path.display()))?;
    Ok(run.winners)
}

fn run_extract_command(args: ExtractArgs) -> anyhow::Result<()> {
    let ids = match &args.from_report {
        Some(report) => winners_from_report(report)?,
        None => args.ids.clone(),
    };
    let written = extract_prompts(&args.prompts, &ids, &args.output)?;

    println!("✓ Extracted {} prompt(s) to {}", written, args.output.display());
    Ok(())
}

// ============================================================================
// Testcases Command
// ============================================================================

#[derive(Debug, Serialize)]
struct TestcasesOutput {
    results: PathBuf,
    solutions: usize,
    passed: usize,
    pass_percentage: f64,
    compile_percentage: f64,
}

async fn run_testcases_command(args: TestcasesArgs, mut config: ForgeConfig) -> anyhow::Result<()> {
    if let Some(extension) = &args.extension {
        config = config.with_testcase_extension(extension.clone());
    }
    if let Some(run) = &args.run {
        config = config.with_testcase_run_command(run.clone());
    }
    if let Some(compile) = &args.compile {
        config = config.with_testcase_compile_command(compile.clone());
    }
    if args.input_suffix.is_some() || args.output_suffix.is_some() {
        let input = args
            .input_suffix
            .clone()
            .unwrap_or_else(|| config.testcase_input_suffix.clone());
        let output = args
            .output_suffix
            .clone()
            .unwrap_or_else(|| config.testcase_output_suffix.clone());
        config = config.with_testcase_suffixes(input, output);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_testcase_timeout(Duration::from_secs(timeout));
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_testcase_concurrency(concurrency);
    }
    config.validate()?;

    let evaluator = TestcaseEvaluator::new(config.testcase_config(&args.testcases))?;
    let reports = evaluator.run_directory(&args.solutions).await?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_results_path(&args.solutions));
    write_reports(&reports, &output).await?;

    let total = reports.len();
    let passed = reports.iter().filter(|r| r.passed).count();
    let compiled = reports.iter().filter(|r| r.compile_success).count();
    let percentage = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 * 100.0 };
    let summary = TestcasesOutput {
        results: output,
        solutions: total,
        passed,
        pass_percentage: percentage(passed),
        compile_percentage: percentage(compiled),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n=== Test-case Results ===");
    println!("Solutions:      {}", summary.solutions);
    println!("Passed:         {} ({:.2}%)", summary.passed, summary.pass_percentage);
    println!("Compiled:       {:.2}%", summary.compile_percentage);
    println!("Results file:   {}", summary.results.display());
    Ok(())
}

// ============================================================================
// Dataset Commands
// ============================================================================

fn run_sample_command(args: SampleArgs) -> anyhow::Result<()> {
    let written = sample_lines(&args.input, &args.output, args.size, args.seed)?;
    println!("✓ Sampled {} line(s) to {}", written, args.output.display());
    Ok(())
}

fn run_merge_command(args: MergeArgs) -> anyhow::Result<()> {
    let stats = merge_completions(&args.primary, &args.fallback, &args.output)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("✓ Merged {} record(s) into {}", stats.total, args.output.display());
    println!("  Filled completions:  {}", stats.filled);
    println!("  Without fallback:    {}", stats.missing);
    Ok(())
}

fn run_normalize_command(args: NormalizeArgs) -> anyhow::Result<()> {
    let count = normalize_tasks(&args.file)?;
    println!("✓ Normalized {} record(s) in {}", count, args.file.display());
    Ok(())
}
