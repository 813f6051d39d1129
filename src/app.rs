//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads the JSON config
//! - runs the pipeline
//! - prints the summary and writes reports and exports

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ConfigArgs, RunArgs};
use crate::domain::PipelineConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sf` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may carry SF_CONFIG or RUST_LOG.
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Check(args) => handle_check(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "series_forecast=debug" } else { "series_forecast=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(args: &ConfigArgs) -> Result<PipelineConfig, AppError> {
    let config = PipelineConfig::load(&args.config)?;
    tracing::info!(path = %args.config.display(), source = %config.data_source, "loaded config");
    Ok(config)
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let mut config = load_config(&args.config)?;
    if let Some(policy) = args.on_error {
        config.failure_policy = policy;
    }
    if let Some(dir) = &args.reports_dir {
        config.reports_dir = dir.clone();
    }

    let run = pipeline::run_pipeline(&config)?;
    let series = &run.prepared.series;
    let outcome = &run.outcome;

    println!("{}", crate::report::format_run_summary(series, outcome, &config));

    if args.plot {
        for (name, f) in &outcome.forecasts {
            if let Some(actual) = series.get(name) {
                println!(
                    "{}",
                    crate::plot::render_ascii_plot(name, actual, &f.forecast, args.width, args.height)
                );
            }
        }
    }

    let tables = outcome.tables();
    if !args.no_report {
        let written = crate::report::write_reports(
            &config.reports_dir,
            series,
            &tables,
            config.y_axis_label.as_deref(),
        )?;
        report_written("reports", &config.reports_dir, written.len());
    }
    if let Some(dir) = &args.export {
        let written = crate::io::write_forecasts_csv(dir, &tables)?;
        report_written("exports", dir, written.len());
    }

    if outcome.is_complete() {
        Ok(())
    } else {
        Err(AppError::new(
            4,
            format!(
                "{} of {} series failed; partial results were written.",
                outcome.failures.len(),
                series.len()
            ),
        ))
    }
}

fn handle_check(args: ConfigArgs) -> Result<(), AppError> {
    let config = load_config(&args)?;
    let prepared = pipeline::prepare(&config)?;

    println!("Source: {}", config.data_source);
    println!("Raw rows: {}", prepared.raw_rows);
    println!("{:<24} {:>6} {:>6}", "series", "rows", "train");
    for (name, s) in &prepared.series {
        println!(
            "{:<24} {:>6} {:>6}",
            name,
            s.len(),
            s.until(config.max_train_date).len()
        );
    }
    Ok(())
}

fn report_written(kind: &str, dir: &Path, count: usize) {
    tracing::info!(dir = %dir.display(), files = count, "wrote {kind}");
}

/// Rewrite argv so `sf` defaults to `sf run`.
///
/// Rules:
/// - `sf`                       -> `sf run`
/// - `sf --config x.json ...`   -> `sf run --config x.json ...`
/// - `sf --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "check");
    if is_subcommand {
        return argv;
    }

    // A leading flag is treated as a `run` flag.
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    argv
}
