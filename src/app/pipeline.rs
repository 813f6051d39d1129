//! Shared pipeline logic used by the `run` and `check` commands.
//!
//! Fixed stage order:
//! extract -> partition -> clean -> normalize -> forecast
//!
//! Reporting and export stay in `app` so this module returns plain data.

use std::collections::BTreeMap;

use crate::domain::{CanonicalSeries, PipelineConfig, Table};
use crate::error::PipelineError;
use crate::fit::ForecastOutcome;
use crate::models::{ForecastModel, TrendSeasonal};

/// Canonical series ready for forecasting.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Rows in the extracted table, before any filtering.
    pub raw_rows: usize,
    pub series: BTreeMap<String, CanonicalSeries>,
}

/// All computed outputs of a single `sf run`.
#[derive(Debug)]
pub struct RunOutput {
    pub prepared: PreparedData,
    pub outcome: ForecastOutcome,
}

/// Extract the configured source and reshape it into canonical series.
pub fn prepare(config: &PipelineConfig) -> Result<PreparedData, PipelineError> {
    let table = crate::io::load_table(config)?;
    prepare_table(&table, config)
}

/// Reshape an already-extracted table.
pub fn prepare_table(table: &Table, config: &PipelineConfig) -> Result<PreparedData, PipelineError> {
    // Fail on the raw header before any per-series work.
    for column in config.required_columns() {
        table.require_column(column)?;
    }

    let partitioned = crate::prep::partition(table, &config.description_column)?;
    let cleaned = crate::prep::clean(&partitioned, config)?;
    let normalized = crate::prep::normalize(&cleaned, config)?;
    let series = crate::prep::canonicalize(&normalized)?;

    let kept: usize = series.values().map(CanonicalSeries::len).sum();
    tracing::info!(
        raw_rows = table.len(),
        kept_rows = kept,
        series = series.len(),
        "prepared canonical series"
    );

    Ok(PreparedData {
        raw_rows: table.len(),
        series,
    })
}

/// Execute the full pipeline with the built-in model.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, PipelineError> {
    let table = crate::io::load_table(config)?;
    run_with_table(&table, config, &TrendSeasonal::new(config.interval_width))
}

/// Execute the pipeline on a pre-extracted table with any model.
pub fn run_with_table<M: ForecastModel>(
    table: &Table,
    config: &PipelineConfig,
    model: &M,
) -> Result<RunOutput, PipelineError> {
    let prepared = prepare_table(table, config)?;
    let outcome = crate::fit::forecast_all(model, &prepared.series, config)?;
    Ok(RunOutput { prepared, outcome })
}
