//! Untyped in-memory tables.
//!
//! Extraction hands the pipeline a [`Table`]: named columns, rows in source
//! order, and loosely typed [`Value`] cells. Every preparation stage consumes a
//! table by reference and produces a new one, so sub-tables never share
//! storage.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDateTime, Timelike};

use crate::error::PipelineError;

/// Ordered mapping from series name to that series' rows.
pub type SeriesSet = BTreeMap<String, Table>;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Infer a typed cell from raw text (CSV fields, spreadsheet strings).
    ///
    /// Empty fields are `Null`. Non-finite floats (`NaN`, `inf`) stay text so
    /// numeric coercion can reject them later.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return Value::Int(v);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Value::Float(v),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Failure-tolerant numeric view: numbers pass through, text is parsed,
    /// everything else (and non-finite results) is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Value::Int(v) => *v as f64,
            Value::Float(v) => *v,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            Value::Null | Value::DateTime(_) => return None,
        };
        v.is_finite().then_some(v)
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::DateTime(ts) if ts.time().num_seconds_from_midnight() == 0 => {
                write!(f, "{}", ts.format("%Y-%m-%d"))
            }
            Value::DateTime(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Row-major table with a fixed column list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Empty table with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, rejecting rows whose width differs from the header.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, PipelineError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), PipelineError> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::Extract(format!(
                "Row has {} cells but the table has {} columns.",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of `name`, or a configuration error naming the missing column.
    pub fn require_column(&self, name: &str) -> Result<usize, PipelineError> {
        self.column_index(name).ok_or_else(|| {
            PipelineError::Configuration(format!(
                "Missing required column: `{name}` (available: {})",
                self.columns.join(", ")
            ))
        })
    }

    /// Iterate the cells of one column in row order.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// True when every non-null cell of the column is an int or float.
    pub fn is_numeric_column(&self, idx: usize) -> bool {
        self.column(idx).all(|v| v.is_null() || v.is_numeric())
    }

    /// Keep rows for which `keep` returns true, preserving order.
    pub fn retain_rows(mut self, mut keep: impl FnMut(&[Value]) -> bool) -> Self {
        self.rows.retain(|row| keep(row));
        self
    }

    /// Replace every cell of one column.
    pub fn map_column(mut self, idx: usize, mut f: impl FnMut(Value) -> Value) -> Self {
        for row in &mut self.rows {
            let cell = std::mem::replace(&mut row[idx], Value::Null);
            row[idx] = f(cell);
        }
        self
    }

    /// Replace every cell of one column, stopping at the first error.
    pub fn try_map_column<E>(
        mut self,
        idx: usize,
        mut f: impl FnMut(Value) -> Result<Value, E>,
    ) -> Result<Self, E> {
        for row in &mut self.rows {
            let cell = std::mem::replace(&mut row[idx], Value::Null);
            row[idx] = f(cell)?;
        }
        Ok(self)
    }

    /// Project onto `indices` (in that order) under new column names.
    pub fn select(&self, indices: &[usize], names: &[&str]) -> Self {
        debug_assert_eq!(indices.len(), names.len());
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Self {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows,
        }
    }
}
