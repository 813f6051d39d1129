//! Narrow cleaned series to the canonical `ds, y` schedule.

use std::collections::BTreeMap;

use crate::domain::{CanonicalSeries, DS, PipelineConfig, SeriesSet, Table, Y};
use crate::error::PipelineError;

/// Rename the date column to `ds` and the target column to `y`, dropping
/// every other column.
///
/// A table that is already canonical passes through unchanged, so applying
/// this twice is a no-op.
pub fn normalize_table(table: &Table, config: &PipelineConfig) -> Result<Table, PipelineError> {
    let date_idx = source_column(table, &config.date_column, DS)?;
    let target_idx = source_column(table, &config.target_column, Y)?;
    Ok(table.select(&[date_idx, target_idx], &[DS, Y]))
}

/// Normalize every series in the set.
pub fn normalize(set: &SeriesSet, config: &PipelineConfig) -> Result<SeriesSet, PipelineError> {
    set.iter()
        .map(|(name, table)| Ok((name.clone(), normalize_table(table, config)?)))
        .collect()
}

/// Convert normalized tables into typed canonical series.
pub fn canonicalize(set: &SeriesSet) -> Result<BTreeMap<String, CanonicalSeries>, PipelineError> {
    set.iter()
        .map(|(name, table)| Ok((name.clone(), CanonicalSeries::from_table(name, table)?)))
        .collect()
}

fn source_column(table: &Table, configured: &str, canonical: &str) -> Result<usize, PipelineError> {
    table
        .column_index(configured)
        .or_else(|| table.column_index(canonical))
        .ok_or_else(|| {
            PipelineError::Configuration(format!(
                "Missing column `{configured}` while building `{canonical}` (available: {})",
                table.columns().join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;
    use chrono::NaiveDate;

    fn config() -> PipelineConfig {
        PipelineConfig::from_json_str(
            r#"{
                "data_source": "data.csv",
                "description_column": "region",
                "date_column": "period",
                "date_format": "%Y-%m",
                "target_column": "value",
                "max_train_date": "2020-06",
                "prediction_start": "2020-07",
                "predict_periods": 3,
                "period_frequency": "MS"
            }"#,
        )
        .unwrap()
    }

    fn cleaned() -> Table {
        let ts = |m| {
            Value::DateTime(NaiveDate::from_ymd_opt(2020, m, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
        };
        Table::from_rows(
            vec!["region".into(), "value".into(), "period".into(), "note".into()],
            vec![
                vec![Value::Text("North".into()), Value::Float(10.0), ts(5), Value::Null],
                vec![Value::Text("North".into()), Value::Float(12.0), ts(6), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn output_is_exactly_ds_then_y() {
        let out = normalize_table(&cleaned(), &config()).unwrap();
        assert_eq!(out.columns(), ["ds", "y"]);
        assert_eq!(out.rows()[0][1], Value::Float(10.0));
        assert_eq!(out.rows()[1][1], Value::Float(12.0));
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let cfg = config();
        let once = normalize_table(&cleaned(), &cfg).unwrap();
        let twice = normalize_table(&once, &cfg).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_source_column_is_configuration_error() {
        let table = cleaned().select(&[0, 1], &["region", "value"]);
        let err = normalize_table(&table, &config()).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(err.to_string().contains("`period`"));
    }

    #[test]
    fn canonicalize_types_each_series() {
        let cfg = config();
        let mut set = SeriesSet::new();
        set.insert("North".into(), cleaned());
        let canonical = canonicalize(&normalize(&set, &cfg).unwrap()).unwrap();
        assert_eq!(canonical["North"].y(), &[10.0, 12.0]);
    }
}
