use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use prompt_harness_core::{AnalysisKind, AnalysisRequest, ModelId};
use prompt_harness_db::{HarnessConfig, ResultStore, default_export_name};
use prompt_harness_runner::{
    BatchOptions, DEFAULT_TEST_COMPANIES, ProviderSet, ResultAssembler, run_batch,
};
use prompt_harness_scoring::output::{
    OutputFormat, format_report, format_result, format_scorecard,
};
use prompt_harness_scoring::{Scorecard, Scorer};
use prompt_harness_server::AppState;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "prompt-harness")]
#[command(version, about = "Run, score and export TAM/DCF prompt tests against LLM providers")]
struct Cli {
    /// Path to a harness YAML config (defaults are used when omitted).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one prompt test against a model provider.
    Run(RunArgs),
    /// Run one test per company context, sequentially.
    Batch(BatchArgs),
    /// Score a saved response file without calling a provider.
    ScoreFile(ScoreFileArgs),
    /// Score every response file in a directory in parallel.
    ScoreDir(ScoreDirArgs),
    /// Start the HTTP server.
    Serve(ServeArgs),
    /// Export stored results as a JSON bundle.
    Export(ExportArgs),
    /// Validate the configuration and report provider readiness.
    CheckConfig,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Analysis kind (tam or dcf).
    #[arg(long, default_value = "tam")]
    kind: AnalysisKind,
    /// Model selector (qwen or gemini).
    #[arg(long, default_value = "qwen")]
    model: ModelId,
    /// Company context sent with the prompt.
    #[arg(long)]
    company: String,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Analysis kind (tam or dcf).
    #[arg(long, default_value = "tam")]
    kind: AnalysisKind,
    /// Model selector (qwen or gemini).
    #[arg(long, default_value = "qwen")]
    model: ModelId,
    /// Company context; repeat for several. The built-in list is used when
    /// neither this nor --companies-file is given.
    #[arg(long = "company")]
    companies: Vec<String>,
    /// File with one company context per line.
    #[arg(long)]
    companies_file: Option<PathBuf>,
    /// Pause between tests in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pause_ms: u64,
    /// Output format for the report.
    #[arg(long, default_value = "markdown")]
    format: OutputFormat,
    /// Write the report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ScoreFileArgs {
    /// Analysis kind (tam or dcf).
    #[arg(long, default_value = "tam")]
    kind: AnalysisKind,
    /// Response text file.
    #[arg(long)]
    input: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ScoreDirArgs {
    /// Analysis kind (tam or dcf).
    #[arg(long, default_value = "tam")]
    kind: AnalysisKind,
    /// Directory of response files.
    #[arg(long)]
    input: PathBuf,
    /// Comma-separated file extensions to score.
    #[arg(long, default_value = "txt,md")]
    extensions: String,
    /// Number of parallel scoring jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Bind address; overrides the configured one.
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Only export results of this kind.
    #[arg(long)]
    kind: Option<AnalysisKind>,
    /// Result log to read; overrides the configured one.
    #[arg(long)]
    log: Option<PathBuf>,
    /// Output file (default: <export_dir>/<kind>_test_results.json).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FileScore {
    file: String,
    #[serde(flatten)]
    scorecard: Scorecard,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Run(args) => run_run(&config, args),
        Command::Batch(args) => run_batch_command(&config, args),
        Command::ScoreFile(args) => run_score_file(&config, args),
        Command::ScoreDir(args) => run_score_dir(&config, args),
        Command::Serve(args) => run_serve(config, args),
        Command::Export(args) => run_export(&config, args),
        Command::CheckConfig => run_check_config(&config),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn load_config(path: Option<&Path>) -> Result<HarnessConfig, String> {
    let config = HarnessConfig::load_or_default(path).map_err(|e| match path {
        Some(path) => format!("failed to load config {}: {e}", path.display()),
        None => e.to_string(),
    })?;
    debug!(config = ?path, "Loaded configuration");
    Ok(config)
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))
}

fn build_assembler(config: &HarnessConfig) -> Result<ResultAssembler, String> {
    let store = ResultStore::open_or_in_memory(config.results.log_path.as_deref())
        .map_err(|e| format!("failed to open result log: {e}"))?;
    let providers =
        ProviderSet::from_config(&config.providers, &config.retry).map_err(|e| e.to_string())?;
    ResultAssembler::from_config(config, providers, Arc::new(store)).map_err(|e| e.to_string())
}

fn build_scorer(config: &HarnessConfig, kind: AnalysisKind) -> Result<Scorer, String> {
    let profile = config.scoring_profile(kind).map_err(|e| e.to_string())?;
    Scorer::new(profile).map_err(|errors| {
        let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
        format!("invalid {kind} profile: {}", joined.join("; "))
    })
}

fn run_run(config: &HarnessConfig, args: RunArgs) -> Result<(), String> {
    let request =
        AnalysisRequest::new(args.company, args.model, args.kind).map_err(|e| e.to_string())?;
    let assembler = build_assembler(config)?;
    let result = runtime()?.block_on(assembler.run(request));
    println!("{}", format_result(&result, args.format)?);
    Ok(())
}

fn run_batch_command(config: &HarnessConfig, args: BatchArgs) -> Result<(), String> {
    let mut companies = args.companies;
    if let Some(ref path) = args.companies_file {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        companies.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );
    }
    if companies.is_empty() {
        companies = DEFAULT_TEST_COMPANIES.iter().map(|c| c.to_string()).collect();
    }

    let assembler = build_assembler(config)?;
    let options =
        BatchOptions::new(args.kind, args.model).with_pause(Duration::from_millis(args.pause_ms));
    let report = runtime()?.block_on(run_batch(&assembler, companies.as_slice(), options));

    let rendered = format_report(&report.results, args.format)?;
    match args.output {
        Some(path) => {
            write_output(&path, &rendered)?;
            info!(path = %path.display(), tests = report.summary.total, "Wrote batch report");
            println!(
                "{} tests, {} passing, average score {:.2} -> {}",
                report.summary.total,
                report.summary.passing,
                report.summary.average_quality_score,
                path.display()
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn run_score_file(config: &HarnessConfig, args: ScoreFileArgs) -> Result<(), String> {
    let scorer = build_scorer(config, args.kind)?;
    let text = fs::read_to_string(&args.input)
        .map_err(|e| format!("failed to read {}: {e}", args.input.display()))?;
    let card = scorer.score(&text);
    let label = args.input.display().to_string();
    println!("{}", format_scorecard(&label, &card, args.format)?);
    Ok(())
}

fn run_score_dir(config: &HarnessConfig, args: ScoreDirArgs) -> Result<(), String> {
    let scorer = build_scorer(config, args.kind)?;
    let extensions = parse_csv_list(&args.extensions);
    let files = collect_response_files(&args.input, &extensions)?;
    if files.is_empty() {
        return Err(format!(
            "no response files with extensions [{}] in {}",
            extensions.join(", "),
            args.input.display()
        ));
    }

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool
        .build()
        .map_err(|e| format!("failed to create thread pool: {e}"))?;

    let scored: Vec<Result<FileScore, String>> = pool.install(|| {
        files
            .par_iter()
            .map(|path| -> Result<FileScore, String> {
                let text = fs::read_to_string(path)
                    .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
                Ok(FileScore {
                    file: path.display().to_string(),
                    scorecard: scorer.score(&text),
                })
            })
            .collect()
    });
    let scored = scored.into_iter().collect::<Result<Vec<_>, _>>()?;
    info!(files = scored.len(), kind = %args.kind, "Scored response directory");

    match args.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&scored)
                .map_err(|e| format!("JSON serialization failed: {e}"))?
        ),
        OutputFormat::Yaml => print!(
            "{}",
            serde_yaml::to_string(&scored)
                .map_err(|e| format!("YAML serialization failed: {e}"))?
        ),
        OutputFormat::Markdown | OutputFormat::Table => {
            for entry in &scored {
                let rendered = format_scorecard(&entry.file, &entry.scorecard, args.format)?;
                print!("{rendered}");
                if args.format == OutputFormat::Markdown {
                    println!();
                }
            }
        }
    }
    Ok(())
}

fn run_serve(config: HarnessConfig, args: ServeArgs) -> Result<(), String> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let assembler = build_assembler(&config)?;
    let state = AppState::new(assembler, config);
    runtime()?
        .block_on(prompt_harness_server::serve(state, &bind))
        .map_err(|e| e.to_string())
}

fn run_export(config: &HarnessConfig, args: ExportArgs) -> Result<(), String> {
    let log = args
        .log
        .or_else(|| config.results.log_path.clone())
        .ok_or_else(|| "no result log configured; pass --log".to_string())?;
    if !log.exists() {
        return Err(format!("result log not found: {}", log.display()));
    }
    let store = ResultStore::open(&log).map_err(|e| e.to_string())?;

    let output = args
        .output
        .unwrap_or_else(|| config.results.export_dir.join(default_export_name(args.kind)));
    let receipt = store
        .export_to_file(args.kind, &output)
        .map_err(|e| e.to_string())?;
    println!(
        "exported {} results to {} (sha256 {})",
        receipt.total_tests,
        receipt.path.display(),
        receipt.checksum
    );
    Ok(())
}

fn run_check_config(config: &HarnessConfig) -> Result<(), String> {
    for kind in AnalysisKind::ALL {
        let scorer = build_scorer(config, kind)?;
        let framework = config
            .framework_text(kind)
            .map_err(|e| e.to_string())?
            .map_or("built-in".to_string(), |text| {
                format!("{} characters", text.chars().count())
            });
        let checklist = &scorer.profile().checklist;
        println!(
            "{}: {} sections, {} elements, {} signals, framework {}, timeout {}s",
            kind.label(),
            checklist.sections.len(),
            checklist.elements.len(),
            checklist.signals.len(),
            framework,
            config.profiles.get(kind).request_timeout_secs
        );
    }

    for model in ModelId::ALL {
        let provider = config.providers.get(model);
        let key = if provider.api_key().is_some() {
            "set"
        } else {
            "missing"
        };
        println!(
            "{model}: {} at {} (key {} {key})",
            provider.model, provider.base_url, provider.api_key_env
        );
    }
    Ok(())
}

fn collect_response_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, String> {
    let entries =
        fs::read_dir(dir).map_err(|e| format!("failed to read {}: {e}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| format!("failed to read {}: {e}", dir.display()))?
            .path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)));
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn parse_csv_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().trim_start_matches('.').to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn write_output(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
    }
    fs::write(path, contents).map_err(|e| format!("failed to write {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_list() {
        assert_eq!(parse_csv_list("txt, .md,,"), vec!["txt", "md"]);
        assert!(parse_csv_list("").is_empty());
    }

    #[test]
    fn test_cli_parses_kind_and_model() {
        let cli = Cli::try_parse_from([
            "prompt-harness",
            "run",
            "--kind",
            "DCF",
            "--model",
            "gemini",
            "--company",
            "Fintech",
        ])
        .unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.kind, AnalysisKind::Dcf);
                assert_eq!(args.model, ModelId::Gemini);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_model() {
        assert!(
            Cli::try_parse_from(["prompt-harness", "run", "--model", "gpt", "--company", "x"])
                .is_err()
        );
    }
}
