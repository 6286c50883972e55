use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use thermolog_core::{compute_kpis, run, FileStatus, PipelineConfig, RunSummary};
use thermolog_parser::clean_file;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "THERMOLOG_CONFIG";

#[derive(Parser, Debug)]
#[command(author, version, about = "Clean thermal sensor logs, compute KPIs and render charts", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean every raw CSV, write the KPI report and render charts
    Run(RunArgs),
    /// Clean a single file and print its statistics
    Clean(CleanArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Configuration file (defaults to $THERMOLOG_CONFIG when set)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,
    #[arg(long)]
    input_dir: Option<PathBuf>,
    #[arg(long)]
    processed_dir: Option<PathBuf>,
    #[arg(long)]
    plots_dir: Option<PathBuf>,
    #[arg(long)]
    reports_dir: Option<PathBuf>,
    /// Glob pattern for raw files inside the input directory
    #[arg(long)]
    pattern: Option<String>,
    /// Alert threshold in °C; readings strictly above it are alerts
    #[arg(long)]
    threshold: Option<f64>,
    /// Skip chart rendering
    #[arg(long)]
    no_plots: bool,
    /// Abort on the first file that cannot be read or written
    #[arg(long)]
    fail_fast: bool,
}

#[derive(Args, Debug)]
struct CleanArgs {
    input: PathBuf,
    output: PathBuf,
    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Run(args) => run_pipeline(args),
        Command::Clean(args) => clean_one(args),
        Command::Config(args) => {
            let config = load_config(&args)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &ConfigArgs) -> Result<PipelineConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            PipelineConfig::from_toml_file(&path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn run_pipeline(args: RunArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(dir) = args.input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = args.processed_dir {
        config.processed_dir = dir;
    }
    if let Some(dir) = args.plots_dir {
        config.plots_dir = dir;
    }
    if let Some(dir) = args.reports_dir {
        config.reports_dir = dir;
    }
    if let Some(pattern) = args.pattern {
        config.pattern = pattern;
    }
    if let Some(threshold) = args.threshold {
        config.alert_threshold = threshold;
    }
    if args.no_plots {
        config.plots.enabled = false;
    }
    if args.fail_fast {
        config.fail_fast = true;
    }

    let summary = run(&config).context("pipeline run failed")?;
    print_summary(&config, &summary);
    Ok(())
}

fn print_summary(config: &PipelineConfig, summary: &RunSummary) {
    if summary.no_input() {
        println!(
            "No raw files matching '{}' in {}",
            config.pattern,
            config.input_dir.display()
        );
        return;
    }

    for file in &summary.files {
        match &file.status {
            FileStatus::Cleaned { stats, kpis, .. } => println!(
                "{} -> {}: {}/{} valid rows, {} alerts ({}%)",
                file.input.display(),
                file.output.display(),
                stats.valid_rows,
                stats.total_rows,
                kpis.alert_count,
                kpis.alert_pct
            ),
            FileStatus::NoValidRows { stats } => println!(
                "Skipping {}: no valid rows out of {}",
                file.input.display(),
                stats.total_rows
            ),
            FileStatus::Failed { error } => {
                println!("Failed {}: {error}", file.input.display())
            }
        }
    }

    match &summary.report_path {
        Some(path) => println!("KPI report: {}", path.display()),
        None => println!("No report written"),
    }
    match &summary.boxplot_path {
        Some(path) => println!("Boxplot: {}", path.display()),
        None if config.plots.enabled => {
            println!("Boxplot not written (no sensor data or render failure)")
        }
        None => {}
    }
    info!(
        cleaned = summary.cleaned_count(),
        empty = summary.empty_count(),
        failed = summary.failed_count(),
        "run complete"
    );
}

fn clean_one(args: CleanArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    config.validate()?;
    let cleaned = clean_file(&args.input, &args.output, &config.cleaner_options())
        .with_context(|| format!("failed to clean {}", args.input.display()))?;

    let stats = &cleaned.stats;
    println!("Input:            {}", args.input.display());
    println!("Output:           {}", args.output.display());
    println!("Total rows:       {}", stats.total_rows);
    println!("Valid rows:       {}", stats.valid_rows);
    println!("Bad timestamps:   {}", stats.bad_timestamp_count);
    println!("Bad values:       {}", stats.bad_value_count);
    println!("Discarded:        {}%", stats.discard_pct());

    let kpis = compute_kpis(&cleaned.temperatures(), config.alert_threshold);
    let fmt = |v: Option<f64>| v.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".into());
    println!("Min:              {}", fmt(kpis.min));
    println!("Max:              {}", fmt(kpis.max));
    println!("Mean:             {}", fmt(kpis.mean));
    println!(
        "Alerts (> {}):    {} ({}%)",
        config.alert_threshold, kpis.alert_count, kpis.alert_pct
    );
    Ok(())
}
