//! Export per-series forecasts to CSV.
//!
//! One file per series, `<name>_forecast.csv`, with the columns
//! `ds,yhat,yhat_lower,yhat_upper`. Meant to be easy to consume in
//! spreadsheets or downstream scripts.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::ForecastTable;
use crate::error::PipelineError;

/// Write one CSV per series into `dir` (created if missing).
pub fn write_forecasts_csv(
    dir: &Path,
    forecasts: &BTreeMap<String, ForecastTable>,
) -> Result<Vec<PathBuf>, PipelineError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        PipelineError::Report(format!("Failed to create export dir '{}': {e}", dir.display()))
    })?;

    let mut written = Vec::with_capacity(forecasts.len());
    for (name, table) in forecasts {
        let path = dir.join(format!("{}_forecast.csv", file_stem(name)));
        write_forecast_csv(&path, table)?;
        written.push(path);
    }
    Ok(written)
}

pub fn write_forecast_csv(path: &Path, table: &ForecastTable) -> Result<(), PipelineError> {
    let mut file = File::create(path).map_err(|e| {
        PipelineError::Report(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "ds,yhat,yhat_lower,yhat_upper")
        .map_err(|e| PipelineError::Report(format!("Failed to write export CSV header: {e}")))?;

    for r in &table.rows {
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6}",
            r.ds.format("%Y-%m-%d %H:%M:%S"),
            r.yhat,
            r.yhat_lower,
            r.yhat_upper,
        )
        .map_err(|e| PipelineError::Report(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Series names come from data, so make them safe as file names.
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        "unnamed".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastRow;
    use chrono::NaiveDate;

    #[test]
    fn file_stems_are_sanitized() {
        assert_eq!(file_stem("North East"), "North_East");
        assert_eq!(file_stem("a/b\\c"), "a_b_c");
        assert_eq!(file_stem(""), "unnamed");
        assert_eq!(file_stem(".."), "unnamed");
    }

    #[test]
    fn writes_one_csv_per_series() {
        let ds = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut forecasts = BTreeMap::new();
        forecasts.insert(
            "North".to_string(),
            ForecastTable::new(vec![ForecastRow {
                ds,
                yhat: 1.5,
                yhat_lower: 1.0,
                yhat_upper: 2.0,
            }]),
        );

        let dir = std::env::temp_dir().join(format!("sf-export-{}", std::process::id()));
        let written = write_forecasts_csv(&dir, &forecasts).unwrap();
        assert_eq!(written, vec![dir.join("North_forecast.csv")]);

        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(
            text,
            "ds,yhat,yhat_lower,yhat_upper\n2021-01-01 00:00:00,1.500000,1.000000,2.000000\n"
        );
        std::fs::remove_dir_all(&dir).ok();
    }
}
