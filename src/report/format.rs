//! Formatted terminal output for a forecast run.
//!
//! Formatting lives here so the pipeline code stays free of presentation
//! details and output changes stay localized.

use std::collections::BTreeMap;

use crate::domain::{CanonicalSeries, ForecastTable, PipelineConfig};
use crate::fit::ForecastOutcome;

/// Format the run summary: configuration, per-series diagnostics and failures.
pub fn format_run_summary(
    series: &BTreeMap<String, CanonicalSeries>,
    outcome: &ForecastOutcome,
    config: &PipelineConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== sf - Multi-Series Forecast ===\n");
    out.push_str(&format!("Source: {}\n", config.data_source));
    out.push_str(&format!(
        "Train cutoff: {} | Prediction start: {}\n",
        config.max_train_date.format("%Y-%m-%d"),
        config.prediction_start.format("%Y-%m-%d"),
    ));
    out.push_str(&format!(
        "Horizon: {} x {} | Interval: {:.0}%\n",
        config.predict_periods,
        config.period_frequency,
        config.interval_width * 100.0,
    ));
    out.push_str(&format!(
        "Series: {} total | {} forecast | {} failed\n",
        series.len(),
        outcome.forecasts.len(),
        outcome.failures.len(),
    ));

    out.push('\n');
    out.push_str(&format_series_table(series, outcome));

    if !outcome.failures.is_empty() {
        out.push_str("\nFailures:\n");
        for err in outcome.failures.values() {
            out.push_str(&format!("- {err}\n"));
        }
    }

    out
}

/// One line per forecast series.
pub fn format_series_table(
    series: &BTreeMap<String, CanonicalSeries>,
    outcome: &ForecastOutcome,
) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<24} {:>6} {:>6} {:>7} {:<10} {:<10} {:>12}\n",
            "series", "rows", "train", "horizon", "first", "last", "last_yhat"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<24} {:-<6} {:-<6} {:-<7} {:-<10} {:-<10} {:-<12}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (name, f) in &outcome.forecasts {
        let rows = series.get(name).map_or(0, CanonicalSeries::len);
        let (first, last, last_yhat) = horizon_bounds(&f.forecast);
        out.push_str(
            format!(
                "{:<24} {:>6} {:>6} {:>7} {:<10} {:<10} {:>12}\n",
                truncate(display_name(name), 24),
                rows,
                f.train_rows,
                f.forecast.len(),
                first,
                last,
                last_yhat,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn horizon_bounds(forecast: &ForecastTable) -> (String, String, String) {
    let day = |r: Option<&crate::domain::ForecastRow>| {
        r.map(|r| r.ds.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let last_yhat = forecast
        .last()
        .map(|r| format!("{:.2}", r.yhat))
        .unwrap_or_else(|| "-".to_string());
    (day(forecast.first()), day(forecast.last()), last_yhat)
}

fn display_name(name: &str) -> &str {
    if name.is_empty() { "(blank)" } else { name }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
