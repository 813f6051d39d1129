//! Split a raw table into one sub-table per series.

use crate::domain::{SeriesSet, Table};
use crate::error::PipelineError;

/// Group rows by the string form of `column`.
///
/// Every row lands in exactly one sub-table (an empty grouping cell forms the
/// `""` series). Column order and row order are preserved, and each
/// sub-table owns copies of its rows.
pub fn partition(table: &Table, column: &str) -> Result<SeriesSet, PipelineError> {
    let idx = table.require_column(column)?;

    let mut set = SeriesSet::new();
    for row in table.rows() {
        set.entry(row[idx].to_string())
            .or_insert_with(|| Table::new(table.columns().to_vec()))
            .push_row(row.clone())?;
    }

    tracing::info!(
        column,
        rows = table.len(),
        series = set.len(),
        "partitioned raw table"
    );
    Ok(set)
}
