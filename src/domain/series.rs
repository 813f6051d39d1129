//! Canonical forecasting inputs and outputs.

use chrono::NaiveDateTime;

use crate::domain::{Table, Value};
use crate::error::PipelineError;

/// Name of the timestamp column in the canonical schedule.
pub const DS: &str = "ds";
/// Name of the value column in the canonical schedule.
pub const Y: &str = "y";

/// A `(ds, y)` schedule: one row per valid observation, source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalSeries {
    ds: Vec<NaiveDateTime>,
    y: Vec<f64>,
}

impl CanonicalSeries {
    pub fn new(ds: Vec<NaiveDateTime>, y: Vec<f64>) -> Result<Self, PipelineError> {
        if ds.len() != y.len() {
            return Err(PipelineError::Configuration(format!(
                "ds and y must have the same length ({} vs {}).",
                ds.len(),
                y.len()
            )));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::Configuration(
                "y must contain only finite values.".to_string(),
            ));
        }
        Ok(Self { ds, y })
    }

    /// Convert a normalized `ds, y` table.
    ///
    /// `ds` cells must already be datetimes and `y` cells numbers; anything
    /// else means cleaning was skipped or the table is not normalized.
    pub fn from_table(series: &str, table: &Table) -> Result<Self, PipelineError> {
        if table.columns() != [DS, Y] {
            return Err(PipelineError::Configuration(format!(
                "Series '{series}': expected columns `ds, y`, found `{}`.",
                table.columns().join(", ")
            )));
        }

        let mut ds = Vec::with_capacity(table.len());
        let mut y = Vec::with_capacity(table.len());
        for row in table.rows() {
            let ts = row[0].as_datetime().ok_or_else(|| PipelineError::DateParse {
                series: series.to_string(),
                value: row[0].to_string(),
                format: "datetime".to_string(),
            })?;
            let value = match &row[1] {
                v @ (Value::Int(_) | Value::Float(_)) => v.as_f64(),
                _ => None,
            }
            .ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "Series '{series}': non-numeric y value '{}' after cleaning.",
                    row[1]
                ))
            })?;
            ds.push(ts);
            y.push(value);
        }
        Ok(Self { ds, y })
    }

    pub fn ds(&self) -> &[NaiveDateTime] {
        &self.ds
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.ds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.ds.iter().copied().zip(self.y.iter().copied())
    }

    /// Rows with `ds <= cutoff`, order preserved.
    pub fn until(&self, cutoff: NaiveDateTime) -> Self {
        let (ds, y) = self.iter().filter(|(ts, _)| *ts <= cutoff).unzip();
        Self { ds, y }
    }

    /// Latest timestamp in the series.
    pub fn last_ds(&self) -> Option<NaiveDateTime> {
        self.ds.iter().max().copied()
    }
}

/// One forecast point with its uncertainty interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRow {
    pub ds: NaiveDateTime,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Model output for one series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastTable {
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn new(rows: Vec<ForecastRow>) -> Self {
        Self { rows }
    }

    /// Keep rows with `ds >= start`.
    pub fn since(mut self, start: NaiveDateTime) -> Self {
        self.rows.retain(|r| r.ds >= start);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&ForecastRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&ForecastRow> {
        self.rows.last()
    }
}
