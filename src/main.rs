//! CLI entry point for `mailcases`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mailcases::cluster::{AssignReason, CaseCollection, CaseEngine};
use mailcases::config::Config;
use mailcases::export;
use mailcases::model::label::DetectedLabel;
use mailcases::parser::{input, labels};
use mailcases::stats::{self, evaluation};

#[derive(Parser)]
#[command(
    name = "mailcases",
    version,
    about = "Group timestamped messages into cases and derive case statistics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Maximum day distance for the actor-proximity fallback
    #[arg(long, global = true, value_name = "DAYS")]
    max_days: Option<i64>,

    /// Field separator of input and output tables
    #[arg(long, global = true, value_name = "CHAR")]
    separator: Option<char>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Group messages into cases and write event log, debug log and corpus
    Group {
        input: PathBuf,
        /// Output directory (defaults to the configured one, then ".")
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Suffix of the output file names (defaults to the input file stem)
        #[arg(long)]
        name: Option<String>,
        /// Detected labels (`Message-ID;DetectedLabel`) to apply before exporting
        #[arg(long)]
        labels: Option<PathBuf>,
    },
    /// List cases with their actors and messages
    Cases {
        input: PathBuf,
        #[arg(long)]
        labels: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Show case count and median duration, message count and headcount
    Stats {
        input: PathBuf,
        #[arg(long)]
        labels: Option<PathBuf>,
        /// Only consider successful (not declined) cases
        #[arg(long)]
        successful: bool,
        #[arg(long)]
        json: bool,
    },
    /// Compare detected labels with train labels
    Score {
        input: PathBuf,
        #[arg(long)]
        labels: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Score practitioners' successful cases against the medians
    Evaluate {
        input: PathBuf,
        #[arg(long)]
        labels: PathBuf,
        /// Practitioner address; repeat for each practitioner, in priority order
        #[arg(long = "actor", required = true)]
        actors: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Effective settings after merging config file and flags.
struct Settings {
    max_days: i64,
    separator: char,
    date_format: String,
    declined: DetectedLabel,
    internal: Option<DetectedLabel>,
    output_dir: Option<PathBuf>,
    weights: evaluation::ScoreWeights,
}

impl Settings {
    fn new(config: &Config, cli: &Cli) -> Self {
        Self {
            max_days: cli.max_days.unwrap_or(config.clustering.max_days),
            separator: cli.separator.unwrap_or(config.export.csv_separator),
            date_format: config.clustering.date_format.clone(),
            declined: DetectedLabel::Code(config.labels.declined_code),
            internal: config
                .labels
                .mark_internal
                .then_some(DetectedLabel::Code(config.labels.internal_code)),
            output_dir: config.export.output_dir.clone(),
            weights: config.evaluation,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = mailcases::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let settings = Settings::new(&config, &cli);

    match cli.command {
        Commands::Group {
            input,
            output,
            name,
            labels,
        } => cmd_group(&input, output, name, labels.as_deref(), &settings),
        Commands::Cases {
            input,
            labels,
            json,
        } => cmd_cases(&input, labels.as_deref(), json, &settings),
        Commands::Stats {
            input,
            labels,
            successful,
            json,
        } => cmd_stats(&input, labels.as_deref(), successful, json, &settings),
        Commands::Score {
            input,
            labels,
            json,
        } => cmd_score(&input, &labels, json, &settings),
        Commands::Evaluate {
            input,
            labels,
            actors,
            json,
        } => cmd_evaluate(&input, &labels, &actors, json, &settings),
        Commands::InitConfig { force } => cmd_init_config(force),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = mailcases::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailcases.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Read the export, cluster it, and apply labels if given.
fn build_cases(
    path: &Path,
    label_file: Option<&Path>,
    settings: &Settings,
) -> anyhow::Result<CaseCollection> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let records = input::load_records(path, settings.separator, &settings.date_format)?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Grouping [{bar:40.cyan/blue}] {pos}/{len} messages")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut engine = CaseEngine::with_collection(
        CaseCollection::with_declined(settings.declined),
        settings.max_days,
    );
    let (mut by_reference, mut by_proximity) = (0usize, 0usize);
    for record in records {
        match engine.assign(record).reason {
            AssignReason::ThreadReference => by_reference += 1,
            AssignReason::ActorProximity => by_proximity += 1,
            AssignReason::NewCase => {}
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    tracing::info!(
        cases = engine.cases().len(),
        by_reference,
        by_proximity,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Grouped messages into cases"
    );

    let mut cases = engine.into_cases();
    if let Some(label_path) = label_file {
        let report = labels::apply_labels(&mut cases, labels::read_labels(label_path, settings.separator)?);
        if !report.unknown.is_empty() {
            eprintln!(
                "  {} label(s) refer to unknown message ids",
                report.unknown.len()
            );
        }
        if let Some(internal) = settings.internal {
            let marked = cases.label_internal_communication(internal);
            tracing::info!(marked, "Marked internal communication");
        }
    }
    Ok(cases)
}

fn cmd_group(
    path: &Path,
    output: Option<PathBuf>,
    name: Option<String>,
    label_file: Option<&Path>,
    settings: &Settings,
) -> anyhow::Result<()> {
    let cases = build_cases(path, label_file, settings)?;

    let dir = output
        .or_else(|| settings.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;
    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cases".to_string())
    });

    let event_log = export::csv::export_event_log(
        &cases,
        &dir,
        &name,
        settings.separator,
        &settings.date_format,
    )?;
    let debug_log = export::csv::export_debug_log(
        &cases,
        &dir,
        &name,
        settings.separator,
        &settings.date_format,
    )?;
    let corpus = export::csv::export_corpus(&cases, &dir, &name)?;

    println!();
    println!("  {:<20} {}", "Cases", cases.len());
    println!("  {:<20} {}", "Messages", cases.record_count());
    println!("  {:<20} {}", "Event log", event_log.display());
    println!("  {:<20} {}", "Debug log", debug_log.display());
    println!("  {:<20} {}", "Corpus", corpus.display());
    println!();
    Ok(())
}

fn cmd_cases(
    path: &Path,
    label_file: Option<&Path>,
    json: bool,
    settings: &Settings,
) -> anyhow::Result<()> {
    let cases = build_cases(path, label_file, settings)?;

    if json {
        let items: Vec<serde_json::Value> = cases
            .iter()
            .map(|c| {
                let d = c.duration();
                serde_json::json!({
                    "id": c.id(),
                    "actors": c.actors(),
                    "messages": c.records().iter().map(|r| r.id()).collect::<Vec<_>>(),
                    "start": d.start.format(&settings.date_format).to_string(),
                    "end": d.end.format(&settings.date_format).to_string(),
                    "duration_seconds": d.elapsed_seconds,
                    "outcome": c.outcome(cases.declined()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for case in &cases {
        let actors: Vec<&str> = case.actors().iter().map(String::as_str).collect();
        println!("  {}", "-".repeat(72));
        println!("  Case {}  ({} message(s))", case.id(), case.message_count());
        println!("  Actors: {}", actors.join(", "));
        for r in case.records() {
            println!(
                "    {}  {:<28} -> {:<28} {}",
                r.timestamp().format(&settings.date_format),
                r.sender(),
                r.recipient(),
                r.subject()
            );
        }
    }
    println!();
    Ok(())
}

fn cmd_stats(
    path: &Path,
    label_file: Option<&Path>,
    successful_only: bool,
    json: bool,
    settings: &Settings,
) -> anyhow::Result<()> {
    let mut cases = build_cases(path, label_file, settings)?;
    if successful_only {
        cases = cases.successful();
    }
    let summary = stats::summarize(&cases)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("  {:<25} {}", "Cases", summary.case_count);
    println!("  {:<25} {}", "Messages", summary.record_count);
    println!("  {:<25} {}", "Successful cases", summary.successful_cases);
    println!(
        "  {:<25} {:.1} h",
        "Median duration",
        summary.median_duration_seconds / 3_600.0
    );
    println!("  {:<25} {}", "Median messages", summary.median_message_count);
    println!("  {:<25} {}", "Median headcount", summary.median_headcount);
    println!();
    Ok(())
}

fn cmd_score(path: &Path, label_file: &Path, json: bool, settings: &Settings) -> anyhow::Result<()> {
    let cases = build_cases(path, Some(label_file), settings)?;
    let quotas = stats::label_quotas(&cases);
    let overall = stats::weighted_score(&quotas)?;

    if json {
        let out = serde_json::json!({
            "labels": quotas,
            "overall": overall,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {:<12} {:>9} {:>8} {:>8} {:>8}",
        "Label", "Dominant", "Match", "Total", "Quota"
    );
    println!("  {}", "-".repeat(49));
    for q in &quotas {
        let dominant = q.dominant.map_or_else(|| "-".to_string(), |c| c.to_string());
        println!(
            "  {:<12} {:>9} {:>8} {:>8} {:>8.3}",
            q.train_label,
            dominant,
            q.matches,
            q.record_count(),
            q.quota
        );
    }
    println!();
    println!("  {:<12} {:.4}", "Overall", overall);
    println!();
    Ok(())
}

fn cmd_evaluate(
    path: &Path,
    label_file: &Path,
    actors: &[String],
    json: bool,
    settings: &Settings,
) -> anyhow::Result<()> {
    let cases = build_cases(path, Some(label_file), settings)?;
    let actors: Vec<&str> = actors.iter().map(String::as_str).collect();
    let rows = evaluation::evaluate_practitioners(&cases, &actors, settings.weights)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!();
    println!(
        "  {:<28} {:<10} {:>10} {:>6} {:>6} {:>7}",
        "Practitioner", "End", "Δ hours", "Δ msg", "Δ head", "Score"
    );
    println!("  {}", "-".repeat(72));
    for r in &rows {
        println!(
            "  {:<28} {:<10} {:>10.1} {:>6} {:>6} {:>7.3}",
            r.practitioner,
            r.end_date.format("%Y-%m-%d"),
            r.duration_delta_hours,
            r.message_delta,
            r.headcount_delta,
            r.score
        );
    }
    println!();
    Ok(())
}

/// Write the default configuration to the standard location.
fn cmd_init_config(force: bool) -> anyhow::Result<()> {
    let path = mailcases::config::config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    mailcases::config::save_config(&Config::default())?;
    println!("  Wrote {}", path.display());
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailcases", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
