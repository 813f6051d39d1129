//! Decode CSV or spreadsheet bytes into a raw `Table`.
//!
//! Design goals:
//! - **No schema assumptions**: every column is kept, cells are typed by
//!   inference (`Value::infer`), and column validation happens downstream
//! - **Stable headers**: names are trimmed and a UTF-8 BOM is stripped
//! - **Ragged rows are tolerated**: short rows are padded with nulls and
//!   extra trailing cells are dropped, with a debug log

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::data::{DataSource, SourceFormat};
use crate::domain::{PipelineConfig, Table, Value};
use crate::error::PipelineError;

/// Fetch and decode the configured data source.
pub fn load_table(config: &PipelineConfig) -> Result<Table, PipelineError> {
    let source = DataSource::parse(&config.data_source);
    let bytes = source.fetch(config.download_timeout)?;
    let table = read_table(&bytes, source.format())?;
    tracing::info!(
        source = %source,
        rows = table.len(),
        columns = table.columns().len(),
        "loaded raw table"
    );
    Ok(table)
}

pub fn read_table(bytes: &[u8], format: SourceFormat) -> Result<Table, PipelineError> {
    match format {
        SourceFormat::Csv => read_csv(bytes),
        SourceFormat::Spreadsheet => read_spreadsheet(bytes),
    }
}

pub fn read_csv(bytes: &[u8]) -> Result<Table, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::Extract(format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(normalize_header_name)
        .collect::<Vec<_>>();

    let mut table = Table::new(headers);
    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header and CSV lines are 1-based.
        let line = idx + 2;
        let record = result
            .map_err(|e| PipelineError::Extract(format!("CSV parse error on line {line}: {e}")))?;
        let cells = record.iter().map(Value::infer).collect();
        table.push_row(fit_width(cells, table.columns().len(), line))?;
    }
    Ok(table)
}

pub fn read_spreadsheet(bytes: &[u8]) -> Result<Table, PipelineError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| PipelineError::Extract(format!("Failed to open spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::Extract("Spreadsheet has no sheets.".to_string()))?
        .map_err(|e| PipelineError::Extract(format!("Failed to read first sheet: {e}")))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or_else(|| PipelineError::Extract("Spreadsheet has no header row.".to_string()))?
        .iter()
        .map(|cell| normalize_header_name(&cell.to_string()))
        .collect::<Vec<_>>();

    let mut table = Table::new(headers);
    for (idx, row) in rows.enumerate() {
        let cells = row.iter().map(cell_value).collect();
        table.push_row(fit_width(cells, table.columns().len(), idx + 2))?;
    }
    Ok(table)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(v) => Value::Int(*v),
        Data::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Value::Int(*v as i64),
        Data::Float(v) => Value::Float(*v),
        Data::String(s) => Value::infer(s),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Value::DateTime)
            .unwrap_or_else(|| Value::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => Value::Text(format!("{e:?}")),
    }
}

fn fit_width(mut cells: Vec<Value>, width: usize, line: usize) -> Vec<Value> {
    if cells.len() != width {
        tracing::debug!(line, cells = cells.len(), width, "resizing ragged row");
        cells.resize(width, Value::Null);
    }
    cells
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, column lookups fail for that column.
    name.trim().trim_start_matches('\u{feff}').to_string()
}
