//! Pipeline configuration.
//!
//! The configuration is a flat JSON object loaded once at startup. Required
//! keys are enforced by serde; everything that can be validated up front
//! (cutoff dates, frequency, interval width) is validated here so that a bad
//! config fails before any data is fetched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::Deserialize;

use crate::domain::Frequency;
use crate::error::PipelineError;

/// What the forecast stage does when one series fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort the run on the first failing series.
    #[default]
    Abort,
    /// Record per-series failures and keep forecasting the rest.
    Continue,
}

/// Rule for discarding structurally invalid date strings before parsing.
///
/// The default rejects values ending in `"13"`, which guards compact
/// `YYYYMM` encodings that use month 13 for annual totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRule {
    rejected_suffixes: Vec<String>,
}

impl DateRule {
    pub fn new(rejected_suffixes: Vec<String>) -> Self {
        Self { rejected_suffixes }
    }

    /// A rule that keeps every row.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    pub fn rejects(&self, date: &str) -> bool {
        self.rejected_suffixes
            .iter()
            .any(|suffix| date.ends_with(suffix.as_str()))
    }

    pub fn suffixes(&self) -> &[String] {
        &self.rejected_suffixes
    }
}

impl Default for DateRule {
    fn default() -> Self {
        Self::new(vec!["13".to_string()])
    }
}

/// Upper bound on the forecast horizon, in periods.
pub const MAX_PREDICT_PERIODS: usize = 100_000;

/// Config file schema, as written on disk.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    data_source: String,
    description_column: String,
    date_column: String,
    date_format: String,
    target_column: String,
    max_train_date: String,
    prediction_start: String,
    predict_periods: usize,
    period_frequency: String,

    #[serde(default)]
    y_axis_label: Option<String>,
    #[serde(default)]
    invalid_date_suffixes: Option<Vec<String>>,
    #[serde(default)]
    on_series_error: FailurePolicy,
    #[serde(default = "default_interval_width")]
    interval_width: f64,
    #[serde(default)]
    reports_dir: Option<PathBuf>,
    #[serde(default = "default_download_timeout_secs")]
    download_timeout_secs: u64,
}

fn default_interval_width() -> f64 {
    0.8
}

fn default_download_timeout_secs() -> u64 {
    30
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// URL (http/https) or local file path.
    pub data_source: String,
    /// Grouping column: one series per distinct value.
    pub description_column: String,
    pub date_column: String,
    /// strftime pattern used for the date column and both cutoff dates.
    pub date_format: String,
    pub target_column: String,
    /// Train cutoff (inclusive).
    pub max_train_date: NaiveDateTime,
    /// First timestamp retained in the forecast output.
    pub prediction_start: NaiveDateTime,
    pub predict_periods: usize,
    pub period_frequency: Frequency,

    pub date_rule: DateRule,
    pub failure_policy: FailurePolicy,
    /// Coverage of the `yhat_lower..yhat_upper` interval, in (0, 1).
    pub interval_width: f64,
    pub y_axis_label: Option<String>,
    pub reports_dir: PathBuf,
    pub download_timeout: Duration,
}

impl PipelineConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!(
                "Failed to read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, PipelineError> {
        let file: ConfigFile = serde_json::from_str(text)
            .map_err(|e| PipelineError::Configuration(format!("Invalid config: {e}")))?;
        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self, PipelineError> {
        for (key, value) in [
            ("data_source", &file.data_source),
            ("description_column", &file.description_column),
            ("date_column", &file.date_column),
            ("date_format", &file.date_format),
            ("target_column", &file.target_column),
        ] {
            if value.trim().is_empty() {
                return Err(PipelineError::Configuration(format!(
                    "Config key `{key}` must not be empty."
                )));
            }
        }

        let max_train_date = parse_config_date("max_train_date", &file.max_train_date, &file.date_format)?;
        let prediction_start =
            parse_config_date("prediction_start", &file.prediction_start, &file.date_format)?;

        let period_frequency = file
            .period_frequency
            .parse::<Frequency>()
            .map_err(PipelineError::Configuration)?;

        if file.predict_periods == 0 || file.predict_periods > MAX_PREDICT_PERIODS {
            return Err(PipelineError::Configuration(format!(
                "Config key `predict_periods` must be in 1..={MAX_PREDICT_PERIODS}, got {}.",
                file.predict_periods
            )));
        }

        if !(file.interval_width > 0.0 && file.interval_width < 1.0) {
            return Err(PipelineError::Configuration(format!(
                "Config key `interval_width` must be in (0, 1), got {}.",
                file.interval_width
            )));
        }

        let date_rule = file
            .invalid_date_suffixes
            .map(DateRule::new)
            .unwrap_or_default();

        Ok(Self {
            data_source: file.data_source,
            description_column: file.description_column,
            date_column: file.date_column,
            date_format: file.date_format,
            target_column: file.target_column,
            max_train_date,
            prediction_start,
            predict_periods: file.predict_periods,
            period_frequency,
            date_rule,
            failure_policy: file.on_series_error,
            interval_width: file.interval_width,
            y_axis_label: file.y_axis_label,
            reports_dir: file.reports_dir.unwrap_or_else(|| PathBuf::from("Reports")),
            download_timeout: Duration::from_secs(file.download_timeout_secs),
        })
    }

    /// Columns the raw table must provide.
    pub fn required_columns(&self) -> [&str; 3] {
        [
            self.description_column.as_str(),
            self.date_column.as_str(),
            self.target_column.as_str(),
        ]
    }
}

fn parse_config_date(key: &str, value: &str, format: &str) -> Result<NaiveDateTime, PipelineError> {
    parse_timestamp(value, format).ok_or_else(|| {
        PipelineError::Configuration(format!(
            "Config key `{key}` ('{value}') does not match date_format '{format}'."
        ))
    })
}

/// Parse a timestamp with a strftime pattern.
///
/// Patterns without a time resolve to midnight. Patterns without a day (or
/// month) field, such as `%Y-%m` or `%Y%m`, resolve to the first day of the
/// period.
pub fn parse_timestamp(raw: &str, format: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
        return Some(ts);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
        return date.and_hms_opt(0, 0, 0);
    }

    const FULL_DATE: [&str; 4] = ["%F", "%D", "%x", "%j"];
    if FULL_DATE.iter().any(|f| format.contains(f)) {
        return None;
    }

    let mut raw_ext = raw.to_string();
    let mut fmt_ext = format.to_string();
    let mut extended = false;
    if !["%m", "%b", "%B", "%h"].iter().any(|f| format.contains(f)) {
        raw_ext.push_str(" 01");
        fmt_ext.push_str(" %m");
        extended = true;
    }
    if !["%d", "%e"].iter().any(|f| format.contains(f)) {
        raw_ext.push_str(" 01");
        fmt_ext.push_str(" %d");
        extended = true;
    }
    if !extended {
        return None;
    }
    NaiveDate::parse_from_str(&raw_ext, &fmt_ext)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
