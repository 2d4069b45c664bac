// Cachelens CLI - Command-line reports for cache metrics
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Cachelens CLI
//!
//! Renders cache-invalidation reports from live metrics and scenario results.
//!
//! ## Usage
//!
//! ```bash
//! # Latest run of scenarios A, B and C plus the live system
//! cachelens latest
//!
//! # Every scenario in a custom result store, without saving
//! cachelens comparison --results-dir ./results --no-save
//!
//! # Live metrics only, with a Prometheus export
//! cachelens current --prometheus kpis.prom
//! ```

mod export;
mod run;

use cachelens::{AnalysisConfig, FallbackService, ReportKind, ReportWriter};
use clap::{Parser, ValueEnum};
use run::{build_input, exported_analyses, publish, RunOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Report to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportArg {
    /// Live metrics only
    Current,
    /// All scenarios in the result store
    Comparison,
    /// Live metrics plus the latest run of each requested scenario
    Latest,
}

impl From<ReportArg> for ReportKind {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::Current => ReportKind::Current,
            ReportArg::Comparison => ReportKind::Comparison,
            ReportArg::Latest => ReportKind::Latest,
        }
    }
}

/// Cachelens cache metrics reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Report kind
    #[arg(value_enum, default_value = "latest")]
    report: ReportArg,

    /// Live metrics directory, file or wildcard
    #[arg(long, default_value = cachelens::DEFAULT_METRICS_DIR)]
    metrics_dir: PathBuf,

    /// Scenario result store
    #[arg(long, default_value = cachelens::DEFAULT_RESULTS_DIR)]
    results_dir: PathBuf,

    /// Directory for saved reports
    #[arg(long, default_value = cachelens::DEFAULT_REPORTS_DIR)]
    reports_dir: PathBuf,

    /// JSON analysis configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario identifiers for the latest report (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    scenarios: Option<Vec<String>>,

    /// Use the metrics file name as service for records without one
    #[arg(long)]
    service_from_file: bool,

    /// Print the report without saving it
    #[arg(long)]
    no_save: bool,

    /// Write KPIs in Prometheus text format to this file
    #[arg(long)]
    prometheus: Option<PathBuf>,

    /// Write KPIs as CSV to this file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    // Logs go to stderr so they never interleave with the report.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> cachelens::Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_json_file(path),
        None => Ok(AnalysisConfig::default()),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("Cachelens v{}", cachelens::VERSION);

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    if args.print_config {
        return match config.to_json_pretty() {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to encode configuration: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut opts = RunOptions::new(args.metrics_dir, args.results_dir, config);
    if let Some(ids) = args.scenarios {
        opts.requested = ids;
    }
    if args.service_from_file {
        opts.fallback = FallbackService::FileStem;
    }

    let kind = ReportKind::from(args.report);
    let now = chrono::Local::now().naive_local();
    let input = build_input(kind, &opts, now);
    let report = cachelens::render(kind, &input);

    let writer = (!args.no_save).then(|| ReportWriter::new(&args.reports_dir));
    let stdout = std::io::stdout();
    if let Err(e) = publish(&report, writer.as_ref(), &mut stdout.lock()) {
        // Display is gone (closed pipe); nothing else to report to.
        warn!("Could not write report: {}", e);
    }

    if args.prometheus.is_some() || args.csv.is_some() {
        let analyses = exported_analyses(&input);
        if let Some(path) = &args.prometheus {
            match export::export_prometheus(path, &analyses) {
                Ok(()) => info!("Prometheus export written to {}", path.display()),
                Err(e) => {
                    warn!("Prometheus export failed: {}", e);
                    eprintln!("Could not write Prometheus export: {}", e);
                }
            }
        }
        if let Some(path) = &args.csv {
            match export::export_csv(path, &analyses) {
                Ok(()) => info!("CSV export written to {}", path.display()),
                Err(e) => {
                    warn!("CSV export failed: {}", e);
                    eprintln!("Could not write CSV export: {}", e);
                }
            }
        }
    }

    ExitCode::SUCCESS
}
