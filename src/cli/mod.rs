//! Command-line parsing for the multi-series forecaster.
//!
//! Argument parsing and command dispatch stay separate from the pipeline code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::FailurePolicy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sf", version, about = "Multi-series forecasting batch pipeline")]
pub struct Cli {
    /// Log at debug level (per-row drops, per-series state transitions).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract, clean, forecast every series and write the HTML reports.
    Run(RunArgs),
    /// Extract and clean only; print per-series row counts without fitting.
    Check(ConfigArgs),
}

/// Where the run configuration comes from.
#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    /// JSON config file.
    #[arg(short, long, env = "SF_CONFIG", default_value = "config.json")]
    pub config: PathBuf,
}

/// Options for a forecast run.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the config's `reports_dir`.
    #[arg(long, value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Skip writing HTML reports.
    #[arg(long)]
    pub no_report: bool,

    /// Export per-series forecasts to `<DIR>/<name>_forecast.csv`.
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Override the config's `on_series_error`.
    #[arg(long, value_enum)]
    pub on_error: Option<FailurePolicy>,

    /// Render an ASCII plot per series in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
