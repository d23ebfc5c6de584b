//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::prelude::*;

use crate::adapters::chart_svg;
use crate::adapters::csv_adapter::{CsvColumns, CsvHistoryAdapter};
use crate::adapters::csv_report_adapter::{format_percent, CsvReportAdapter};
use crate::adapters::datayes_adapter::DataYesAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::{analyze_aligned, analyze_history, ReportRow, DEFAULT_WINDOW};
use crate::domain::batch::{run_batch, BatchOutcome};
use crate::domain::error::SmacrossError;
use crate::domain::price_series::AlignedHistory;
use crate::domain::security_id::parse_ids;
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "smacross",
    about = "Moving-average crossover evaluation over daily closing prices"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch price history from the market data API and evaluate it
    Fetch {
        /// One or more equity codes, comma separated
        #[arg(short, long = "id")]
        ids: String,
        /// Output report file
        #[arg(short, long)]
        file: PathBuf,
        /// Market data API token
        #[arg(short, long)]
        token: Option<String>,
        /// Moving-average window in trading days
        #[arg(short, long)]
        window: Option<usize>,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Evaluate CSV exports that already carry a moving-average column
    Csv {
        /// A CSV file or a directory of CSV files
        #[arg(short, long)]
        input: PathBuf,
        /// Output report file
        #[arg(short, long)]
        file: PathBuf,
        /// Header of the moving-average column
        #[arg(long)]
        ma_column: Option<String>,
        #[command(flatten)]
        options: RunOptions,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunOptions {
    /// INI configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Worker threads (0 = one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,
    /// Log every trade and its return
    #[arg(long)]
    pub print_trades: bool,
    /// Write a price/average SVG chart per instrument into this directory
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,
}

/// Settings resolved from flags over the config file.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub jobs: usize,
    pub print_trades: bool,
    pub plot_dir: Option<PathBuf>,
}

pub fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::filter::Targets::new()
                .with_target("reqwest", tracing::Level::WARN)
                .with_target("hyper", tracing::Level::WARN)
                .with_target("hyper_util", tracing::Level::WARN)
                .with_default(level),
        );
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Dispatch a parsed command line. Per-instrument failures are reported, not returned.
pub fn execute(cli: Cli) -> Result<(), SmacrossError> {
    match cli.command {
        Command::Fetch {
            ids,
            file,
            token,
            window,
            options,
        } => run_fetch(&ids, &file, token.as_deref(), window, &options),
        Command::Csv {
            input,
            file,
            ma_column,
            options,
        } => run_csv(&input, &file, ma_column.as_deref(), &options),
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, SmacrossError> {
    match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading config");
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn resolve_window(
    window_override: Option<usize>,
    config: &dyn ConfigPort,
) -> Result<usize, SmacrossError> {
    let window = match window_override {
        Some(w) => w as i64,
        None => config.get_int("analysis", "window", DEFAULT_WINDOW as i64),
    };
    if window < 1 {
        return Err(SmacrossError::ConfigInvalid {
            section: "analysis".into(),
            key: "window".into(),
            reason: format!("must be at least 1, got {}", window),
        });
    }
    Ok(window as usize)
}

pub fn resolve_settings(
    options: &RunOptions,
    config: &dyn ConfigPort,
) -> Result<RunSettings, SmacrossError> {
    let jobs = match options.jobs {
        Some(j) => j as i64,
        None => config.get_int("analysis", "jobs", 0),
    };
    if jobs < 0 {
        return Err(SmacrossError::ConfigInvalid {
            section: "analysis".into(),
            key: "jobs".into(),
            reason: format!("must not be negative, got {}", jobs),
        });
    }

    let plot_dir = options
        .plot_dir
        .clone()
        .or_else(|| config.get_string("report", "plot_dir").map(PathBuf::from));

    Ok(RunSettings {
        jobs: jobs as usize,
        print_trades: options.print_trades
            || config.get_bool("analysis", "print_trades", false),
        plot_dir,
    })
}

fn run_fetch(
    ids: &str,
    output: &Path,
    token: Option<&str>,
    window: Option<usize>,
    options: &RunOptions,
) -> Result<(), SmacrossError> {
    let config = load_config(options.config.as_ref())?;
    let window = resolve_window(window, &config)?;
    let settings = resolve_settings(options, &config)?;
    let codes = parse_ids(ids)?;
    let port = DataYesAdapter::from_config(&config, token)?;

    tracing::info!(instruments = codes.len(), window, "evaluating live history");
    let outcome = run_fetch_pipeline(&port, &codes, window, settings.jobs)?;
    finish(&outcome, output, &CsvReportAdapter, &settings)
}

fn run_csv(
    input: &Path,
    output: &Path,
    ma_column: Option<&str>,
    options: &RunOptions,
) -> Result<(), SmacrossError> {
    let config = load_config(options.config.as_ref())?;
    let settings = resolve_settings(options, &config)?;
    let mut columns = CsvColumns::from_config(&config);
    if let Some(column) = ma_column {
        columns.moving_average = column.to_string();
    }

    tracing::info!(input = %input.display(), ma_column = %columns.moving_average, "loading csv exports");
    let histories = CsvHistoryAdapter::new(columns).load_path(input)?;
    let outcome = run_csv_pipeline(&histories, settings.jobs)?;
    finish(&outcome, output, &CsvReportAdapter, &settings)
}

/// Fetch and evaluate every code independently.
pub fn run_fetch_pipeline(
    port: &dyn HistoryPort,
    codes: &[String],
    window: usize,
    jobs: usize,
) -> Result<BatchOutcome, SmacrossError> {
    run_batch(codes, jobs, |code| code.clone(), |code| {
        let history = port.fetch_history(code)?;
        analyze_history(&history, window)
    })
}

/// Evaluate every pre-aligned history independently.
pub fn run_csv_pipeline(
    histories: &[AlignedHistory],
    jobs: usize,
) -> Result<BatchOutcome, SmacrossError> {
    run_batch(
        histories,
        jobs,
        |history| history.instrument.id.clone(),
        analyze_aligned,
    )
}

/// Trades log, charts, report file and console summary.
pub fn finish(
    outcome: &BatchOutcome,
    output: &Path,
    report_port: &dyn ReportPort,
    settings: &RunSettings,
) -> Result<(), SmacrossError> {
    if settings.print_trades {
        for report in &outcome.reports {
            for (trade, ratio) in report.trades.iter().zip(&report.summary.returns) {
                tracing::info!(
                    instrument = %report.row.instrument_id,
                    entry = trade.entry_price,
                    exit = trade.exit_price,
                    ret = %format_percent(*ratio),
                    "trade"
                );
            }
        }
    }

    if let Some(dir) = &settings.plot_dir {
        for report in &outcome.reports {
            match chart_svg::write_chart(dir, report) {
                Ok(path) => tracing::debug!(path = %path.display(), "chart written"),
                Err(e) => tracing::error!(
                    instrument = %report.row.instrument_id,
                    error = %e,
                    "failed to write chart"
                ),
            }
        }
    }

    let rows: Vec<ReportRow> = outcome.reports.iter().map(|r| r.row.clone()).collect();
    report_port.write(&rows, output)?;

    print_summary(outcome);
    eprintln!("\nReport written to: {}", output.display());
    Ok(())
}

fn print_summary(outcome: &BatchOutcome) {
    eprintln!("\n=== Crossover Summary ===");
    for report in &outcome.reports {
        let row = &report.row;
        eprintln!(
            "  {} {}:  {} trades, total {}, best {}, worst {}, {}W/{}L",
            row.instrument_id,
            row.display_name,
            row.trade_count,
            format_percent(row.aggregate_return),
            format_percent(row.best_return),
            format_percent(row.worst_return),
            row.win_count,
            row.loss_count,
        );
    }

    if !outcome.failures.is_empty() {
        eprintln!("\n=== Failed ===");
        for failure in &outcome.failures {
            eprintln!("  {}: {}", failure.instrument_id, failure.error);
        }
    }

    eprintln!(
        "\n{} of {} instruments evaluated",
        outcome.reports.len(),
        outcome.total()
    );
}
