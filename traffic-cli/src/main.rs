//! Traffic pipeline CLI — download, check, and merge commands.
//!
//! Commands:
//! - `download` — fetch per-country traffic series across month windows and
//!   write one CSV per country
//! - `check` — compare every stored series' timestamp index against the
//!   first one
//! - `merge` — combine all stored series into one wide CSV keyed by
//!   timestamp

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use traffic_core::config::PipelineConfig;
use traffic_core::{
    download_entities, merge_store_to_file, validate_store, FetchClient, HttpTransport, RunStats,
    SeriesStore,
};

mod entities;

#[derive(Parser)]
#[command(
    name = "traffic",
    about = "Per-country traffic series pipeline: download, check, merge"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download per-country traffic series and write one CSV per country.
    Download {
        /// TOML config file. When given, the remaining flags are ignored.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Start date (YYYY-MM-DD).
        #[arg(long, default_value = "2019-01-01")]
        start: String,

        /// End date (YYYY-MM-DD, inclusive). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Output directory for per-country CSV files.
        #[arg(long, default_value = "traffic_data_monthly")]
        output_dir: PathBuf,

        /// Directory for raw bodies of malformed responses.
        #[arg(long, default_value = "error_responses_monthly")]
        error_dir: PathBuf,

        /// File with country codes, one per line. Defaults to the built-in
        /// list.
        #[arg(long)]
        entities_file: Option<PathBuf>,

        /// Courtesy delay between API requests, in milliseconds.
        #[arg(long, default_value_t = 500)]
        delay_ms: u64,

        /// Attempts per window before recording a gap.
        #[arg(long, default_value_t = 3)]
        max_retries: u32,

        /// Base backoff delay in milliseconds (doubles per failed attempt).
        #[arg(long, default_value_t = 2000)]
        base_delay_ms: u64,
    },
    /// Check timestamp consistency across stored series.
    Check {
        /// Directory with per-country CSV files.
        input_dir: PathBuf,
    },
    /// Merge stored series into a single wide CSV.
    Merge {
        /// Directory with per-country CSV files.
        input_dir: PathBuf,

        /// Path for the merged CSV.
        output_file: PathBuf,
    },
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Download {
            config,
            start,
            end,
            output_dir,
            error_dir,
            entities_file,
            delay_ms,
            max_retries,
            base_delay_ms,
        } => {
            let config = match config {
                Some(path) => {
                    if entities_file.is_some() {
                        bail!("--config and --entities-file are mutually exclusive");
                    }
                    PipelineConfig::from_file(&path)?
                }
                None => PipelineConfig {
                    entities: load_entities(entities_file.as_deref())?,
                    start: parse_start_date(&start)?,
                    end: parse_end_date(end.as_deref())?,
                    output_dir,
                    error_dir,
                    request_delay_ms: delay_ms,
                    max_retries,
                    base_delay_ms,
                },
            };
            run_download(config)
        }
        Commands::Check { input_dir } => run_check(&input_dir),
        Commands::Merge {
            input_dir,
            output_file,
        } => run_merge(&input_dir, &output_file),
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn parse_start_date(text: &str) -> Result<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("invalid start date '{text}'"))?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap())
}

/// Inclusive end: the last second of the given day, today when omitted.
fn parse_end_date(text: Option<&str>) -> Result<NaiveDateTime> {
    let date = match text {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .with_context(|| format!("invalid end date '{text}'"))?,
        None => chrono::Local::now().date_naive(),
    };
    Ok(date.and_hms_opt(23, 59, 59).unwrap())
}

fn load_entities(path: Option<&Path>) -> Result<Vec<String>> {
    let codes: Vec<String> = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read entities file {}", path.display()))?;
            text.lines()
                .map(|line| line.trim().to_uppercase())
                .filter(|line| !line.is_empty())
                .collect()
        }
        None => {
            tracing::info!(count = entities::DEFAULT_ENTITIES.len(), "using built-in country list");
            entities::DEFAULT_ENTITIES.iter().map(|s| s.to_string()).collect()
        }
    };
    Ok(codes)
}

fn run_download(mut config: PipelineConfig) -> Result<()> {
    let rejected = config.retain_valid_entities();
    for code in &rejected {
        tracing::warn!(code = %code, "ignoring malformed country code");
    }
    if config.entities.is_empty() {
        bail!("no valid country codes to download");
    }

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("cannot create output directory {}", config.output_dir.display())
    })?;
    std::fs::create_dir_all(&config.error_dir).with_context(|| {
        format!("cannot create error directory {}", config.error_dir.display())
    })?;

    tracing::info!(
        entities = config.entities.len(),
        start = %config.start,
        end = %config.end,
        "starting download"
    );

    let client = FetchClient::new(
        Box::new(HttpTransport::new()),
        config.retry_policy(),
        config.request_delay(),
    );
    let store = SeriesStore::new(&config.output_dir);
    let stats = RunStats::new();

    let summary = download_entities(&client, &store, &config, &stats)?;
    stats.log_summary();
    summary.log();

    println!();
    println!("=== Download Summary ===");
    println!("Successful countries: {}", summary.succeeded);
    println!("Failed countries:     {}", summary.failed);
    println!("Total data points:    {}", summary.total_points);
    println!("Gap windows:          {}", summary.gaps);
    println!("Shape anomalies:      {}", summary.shape_anomalies);

    if !summary.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_check(input_dir: &Path) -> Result<()> {
    if !input_dir.exists() {
        bail!("input directory {} not found", input_dir.display());
    }

    let store = SeriesStore::new(input_dir);
    let summary = validate_store(&store)?;

    match &summary.reference_entity {
        Some(entity) => println!("Reference index taken from '{entity}'."),
        None => bail!("no readable CSV files in {}", input_dir.display()),
    }

    for report in summary.reports.iter().filter(|r| !r.is_consistent()) {
        println!();
        println!("'{}' deviates from the reference:", report.entity_id);
        if !report.missing.is_empty() {
            println!("  missing {} timestamp(s):", report.missing.len());
            for ts in report.missing.iter().take(5) {
                println!("    missing: {ts}");
            }
            if report.missing.len() > 5 {
                println!("    ...and more");
            }
        }
        if !report.extra.is_empty() {
            println!("  {} extra timestamp(s):", report.extra.len());
            for ts in report.extra.iter().take(5) {
                println!("    extra: {ts}");
            }
            if report.extra.len() > 5 {
                println!("    ...and more");
            }
        }
        if !report.positional_mismatches.is_empty() {
            println!(
                "  {} timestamp(s) differ positionally:",
                report.positional_mismatches.len()
            );
            for m in report.positional_mismatches.iter().take(5) {
                println!(
                    "    position {}: expected {}, found {}",
                    m.index + 1,
                    m.expected,
                    m.actual
                );
            }
            if report.positional_mismatches.len() > 5 {
                println!("    ...and more");
            }
        }
        if let Some(shortfall) = report.length_shortfall {
            println!("  candidate is {shortfall} element(s) shorter than the reference");
        }
    }

    for (entity, reason) in &summary.unreadable {
        println!("'{entity}' could not be read: {reason}");
    }

    println!();
    println!(
        "Checked series: {} consistent, {} inconsistent, {} unreadable",
        summary.consistent,
        summary.inconsistent,
        summary.unreadable.len()
    );

    if !summary.all_consistent() {
        std::process::exit(1);
    }
    println!("All series share the reference timestamp index.");
    Ok(())
}

fn run_merge(input_dir: &Path, output_file: &Path) -> Result<()> {
    if !input_dir.exists() {
        bail!("input directory {} not found", input_dir.display());
    }

    let store = SeriesStore::new(input_dir);
    let stats = merge_store_to_file(&store, output_file)
        .with_context(|| format!("merge into {} failed", output_file.display()))?;

    println!();
    println!("=== Merge Summary ===");
    println!("Files processed:  {}", stats.files_processed);
    println!("Files skipped:    {}", stats.skipped.len());
    println!("Total countries:  {}", stats.total_entities);
    println!("Total timestamps: {}", stats.total_timestamps);
    for (entity, reason) in stats.skipped.iter().take(10) {
        println!("  skipped {entity}: {reason}");
    }
    if let Some((entity, coverage)) = stats
        .coverage
        .iter()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
    {
        println!("Lowest coverage:  {entity} at {:.1}%", coverage * 100.0);
    }

    if !stats.clean() {
        std::process::exit(1);
    }
    Ok(())
}
