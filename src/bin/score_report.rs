use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pronunciation_scoring::{
    aggregate_reports, compute_case_report, CaseReport, Meta, PronunciationScorer,
    PronunciationScorerBuilder, RecognitionSegment, Report, ScoringConfig, ScoringInput,
};
use serde::Deserialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[path = "score_report/json_report_formatter.rs"]
mod json_report_formatter;
#[path = "score_report/text_grid_report_formatter.rs"]
mod text_grid_report_formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    #[value(name = "textgrid")]
    TextGrid,
}

#[derive(Debug, Parser)]
#[command(about = "Score recognition results against reference texts and write a report")]
struct Args {
    #[arg(
        long,
        env = "PRONUNCIATION_REPORT_CASES_DIR",
        default_value = "test-data/cases"
    )]
    cases_dir: PathBuf,
    #[arg(long, env = "PRONUNCIATION_REPORT_OUT")]
    out: Option<PathBuf>,
    /// JSON scoring config; defaults are used when omitted.
    #[arg(long, env = "PRONUNCIATION_REPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "PRONUNCIATION_REPORT_LOCALE", default_value = "en-US")]
    locale: String,
    #[arg(long, env = "PRONUNCIATION_REPORT_LIMIT")]
    limit: Option<usize>,
    #[arg(long, env = "PRONUNCIATION_REPORT_OFFSET", default_value_t = 0)]
    offset: usize,
    #[arg(
        long,
        env = "PRONUNCIATION_REPORT_FORMAT",
        value_enum,
        default_value_t = OutputFormat::Json
    )]
    output_format: OutputFormat,
    #[arg(long, env = "PRONUNCIATION_REPORT_TEXTGRID_SUFFIX", default_value = "")]
    textgrid_suffix: String,
    /// Embed the full score result of every case in the JSON report.
    #[arg(long, env = "PRONUNCIATION_REPORT_FULL_RESULTS", default_value_t = false)]
    full_results: bool,
    #[arg(long, env = "PRONUNCIATION_REPORT_NO_MISCUE", default_value_t = false)]
    no_miscue: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct CaseFile {
    id: String,
    reference_text: String,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Clone)]
struct Case {
    path: PathBuf,
    file: CaseFile,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let cases_dir = resolve_path(&repo_root, &args.cases_dir);
    let out_path = match args.output_format {
        OutputFormat::Json => Some(resolve_out_path(&repo_root, args.out.as_ref())),
        OutputFormat::TextGrid => None,
    };

    let mut cases = load_cases(&cases_dir)?;
    if args.offset > 0 {
        cases = cases.into_iter().skip(args.offset).collect();
    }
    if let Some(limit) = args.limit {
        cases.truncate(limit);
    }
    if cases.is_empty() {
        return Err("No cases selected after applying offset/limit.".to_string());
    }

    let scorer = build_scorer(&repo_root, args.config.as_ref(), args.no_miscue)?;

    let mut case_reports: Vec<CaseReport> = Vec::with_capacity(cases.len());
    let mut written_textgrids = 0usize;
    let mut scoring_elapsed = Duration::ZERO;
    let progress = ProgressBar::new(cases.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("starting...");

    for case in &cases {
        progress.set_message(case.file.id.clone());
        let locale = case
            .file
            .locale
            .clone()
            .unwrap_or_else(|| args.locale.clone());
        let segments = case
            .file
            .results
            .iter()
            .cloned()
            .map(RecognitionSegment::from_payload)
            .collect();
        let input = ScoringInput::new(case.file.reference_text.clone(), locale.clone(), segments);

        let started = Instant::now();
        let result = scorer.score(&input);
        scoring_elapsed += started.elapsed();

        match args.output_format {
            OutputFormat::Json => {
                let report =
                    compute_case_report(&case.file.id, &locale, &result, args.full_results)
                        .map_err(|err| format!("Case '{}': {err}", case.file.id))?;
                case_reports.push(report);
            }
            OutputFormat::TextGrid => {
                text_grid_report_formatter::write_textgrid(
                    &case.path,
                    &case.file.reference_text,
                    &result,
                    &args.textgrid_suffix,
                )?;
                written_textgrids += 1;
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("scoring pass complete");

    let scoring_seconds = scoring_elapsed.as_secs_f64();
    println!(
        "scoring_elapsed: {:.2}s ({}) avg_per_case: {:.3}ms",
        scoring_seconds,
        format_duration_hms(scoring_elapsed),
        scoring_seconds * 1000.0 / cases.len() as f64
    );

    match args.output_format {
        OutputFormat::Json => {
            let aggregates = aggregate_reports(&case_reports);
            let report = Report {
                schema_version: 1,
                meta: Meta {
                    generated_at: Utc::now().to_rfc3339(),
                    config: scorer.config().clone(),
                    case_count: case_reports.len(),
                },
                cases: case_reports,
                aggregates,
            };

            let out_path = out_path.ok_or_else(|| {
                "internal error: missing output path for JSON report format".to_string()
            })?;
            json_report_formatter::write_report(&out_path, &report)?;
            println!("{}", out_path.display());
        }
        OutputFormat::TextGrid => {
            if args.textgrid_suffix.is_empty() {
                println!("Wrote {written_textgrids} TextGrid file(s) alongside case files.");
            } else {
                println!(
                    "Wrote {written_textgrids} TextGrid file(s) with suffix '{}' alongside case files.",
                    args.textgrid_suffix
                );
            }
        }
    }
    Ok(())
}

fn build_scorer(
    repo_root: &Path,
    config: Option<&PathBuf>,
    no_miscue: bool,
) -> Result<PronunciationScorer, String> {
    let builder = match config {
        Some(path) => {
            let path = resolve_path(repo_root, path);
            require_path_exists(&path, "Missing scoring config.")?;
            PronunciationScorerBuilder::from_config_file(&path)
                .map_err(|err| format!("Failed to load scoring config: {err}"))?
        }
        None => PronunciationScorerBuilder::new(ScoringConfig::default()),
    };
    let builder = if no_miscue {
        builder.with_miscue(false)
    } else {
        builder
    };
    builder
        .build()
        .map_err(|err| format!("Failed to build PronunciationScorer: {err}"))
}

fn load_cases(cases_dir: &Path) -> Result<Vec<Case>, String> {
    require_path_exists(cases_dir, "Missing cases directory.")?;

    let mut paths = Vec::new();
    collect_case_files(cases_dir, &mut paths)?;
    paths.sort();
    if paths.is_empty() {
        return Err(format!(
            "No case files (*.json) found in '{}'.",
            cases_dir.display()
        ));
    }

    paths.into_iter().map(|path| parse_case(&path)).collect()
}

fn collect_case_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), String> {
    let entries = fs::read_dir(dir)
        .map_err(|err| format!("Failed to read directory '{}': {err}", dir.display()))?;
    for entry in entries {
        let entry = entry.map_err(|err| {
            format!("Failed to read directory entry in '{}': {err}", dir.display())
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_case_files(&path, out)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            out.push(path);
        }
    }
    Ok(())
}

fn parse_case(path: &Path) -> Result<Case, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read case file '{}': {err}", path.display()))?;
    let file: CaseFile = serde_json::from_str(&raw)
        .map_err(|err| format!("Failed to parse case file '{}': {err}", path.display()))?;
    Ok(Case {
        path: path.to_path_buf(),
        file,
    })
}

fn resolve_out_path(repo_root: &Path, out: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = out {
        return resolve_path(repo_root, path);
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    repo_root
        .join("target")
        .join("score_reports")
        .join(format!("score-report-{run_id}.json"))
}

fn resolve_path(repo_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}

fn format_duration_hms(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

fn require_path_exists(path: &Path, message: &str) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    Err(format!("{message} Missing path: {}", path.display()))
}
