//! Date and target validation for each series.
//!
//! Per series, in order:
//!
//! 1. the date column is rendered to text
//! 2. rows rejected by the configured `DateRule` are dropped (silently)
//! 3. the remaining dates are parsed with `date_format`; a failure here is a
//!    hard `DateParse` error, never a silent drop
//! 4. the target column is coerced to numbers; rows that fail coercion are
//!    dropped with a warning naming the series
//!
//! Cleaning only deletes rows, it never reorders them.

use crate::domain::{PipelineConfig, SeriesSet, Table, Value, parse_timestamp};
use crate::error::PipelineError;

/// Clean every series in the set.
pub fn clean(set: &SeriesSet, config: &PipelineConfig) -> Result<SeriesSet, PipelineError> {
    set.iter()
        .map(|(name, table)| Ok((name.clone(), clean_series(name, table, config)?)))
        .collect()
}

/// Clean one series.
pub fn clean_series(name: &str, table: &Table, config: &PipelineConfig) -> Result<Table, PipelineError> {
    let date_idx = table.require_column(&config.date_column)?;
    let target_idx = table.require_column(&config.target_column)?;
    let rows_in = table.len();

    let table = table
        .clone()
        .map_column(date_idx, |v| Value::Text(v.to_string()));

    let table = table.retain_rows(|row| {
        let date = row[date_idx].as_str().unwrap_or_default();
        let rejected = config.date_rule.rejects(date);
        if rejected {
            tracing::debug!(series = name, date, "dropping row rejected by date rule");
        }
        !rejected
    });
    let after_rule = table.len();

    let table = table.try_map_column(date_idx, |v| {
        let raw = v.to_string();
        parse_timestamp(&raw, &config.date_format)
            .map(Value::DateTime)
            .ok_or_else(|| PipelineError::DateParse {
                series: name.to_string(),
                value: raw,
                format: config.date_format.clone(),
            })
    })?;

    let table = if table.is_numeric_column(target_idx) {
        table
    } else {
        let bad = table
            .column(target_idx)
            .filter(|v| !v.is_null() && v.as_f64().is_none())
            .count();
        tracing::warn!(
            series = name,
            column = %config.target_column,
            non_numeric = bad,
            "Non-numeric values found in target column; dropping those rows"
        );
        table.map_column(target_idx, |v| match v.as_f64() {
            Some(x) => Value::Float(x),
            None => Value::Null,
        })
    };

    let table = table.retain_rows(|row| !row[target_idx].is_null());

    tracing::debug!(
        series = name,
        rows_in,
        dropped_by_date_rule = rows_in - after_rule,
        dropped_missing_target = after_rule - table.len(),
        rows_out = table.len(),
        "cleaned series"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    fn config(date_format: &str) -> PipelineConfig {
        let cutoff = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap().format(date_format);
        let start = NaiveDate::from_ymd_opt(2020, 7, 1).unwrap().format(date_format);
        PipelineConfig::from_json_str(&format!(
            r#"{{
                "data_source": "data.csv",
                "description_column": "region",
                "date_column": "period",
                "date_format": "{date_format}",
                "target_column": "value",
                "max_train_date": "{cutoff}",
                "prediction_start": "{start}",
                "predict_periods": 3,
                "period_frequency": "MS"
            }}"#
        ))
        .unwrap()
    }

    fn table(rows: &[(&str, &str)]) -> Table {
        Table::from_rows(
            vec!["period".into(), "value".into(), "note".into()],
            rows.iter()
                .map(|(d, v)| vec![Value::infer(d), Value::infer(v), Value::Text("x".into())])
                .collect(),
        )
        .unwrap()
    }

    /// Shared buffer the test subscriber writes formatted events into.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` under a plain-text subscriber and return everything it logged.
    fn logs_of(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn month(y: i32, m: u32) -> Value {
        Value::DateTime(NaiveDate::from_ymd_opt(y, m, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    #[test]
    fn drops_non_numeric_targets() {
        let cfg = config("%Y-%m");
        let input = table(&[("2020-05", "10"), ("2020-06", "12"), ("2020-07", "abc")]);
        let out = clean_series("North", &input, &cfg).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out.rows()[0][0], month(2020, 5));
        assert_eq!(out.rows()[1][0], month(2020, 6));
        assert_eq!(out.rows()[0][1], Value::Float(10.0));
        assert_eq!(out.rows()[1][1], Value::Float(12.0));
        // Non-target columns are untouched.
        assert_eq!(out.columns(), ["period", "value", "note"]);
    }

    #[test]
    fn non_numeric_target_warns_with_series_name() {
        let cfg = config("%Y-%m");
        let input = table(&[("2020-05", "10"), ("2020-06", "12"), ("2020-07", "abc")]);
        let logs = logs_of(|| {
            clean_series("North", &input, &cfg).unwrap();
        });

        let warning = logs
            .lines()
            .find(|l| l.contains("WARN"))
            .unwrap_or_else(|| panic!("no warning logged:\n{logs}"));
        assert!(warning.contains(r#"series="North""#), "{warning}");
        assert!(warning.contains("non_numeric=1"), "{warning}");
    }

    #[test]
    fn rule_rejected_token_does_not_warn() {
        let cfg = config("%Y%m");
        let input = table(&[("202012", "7"), ("202013", "n/a"), ("202101", "8")]);
        let logs = logs_of(|| {
            clean_series("North", &input, &cfg).unwrap();
        });
        assert!(!logs.contains("WARN"), "{logs}");
        // The dropped row is still traced at debug level.
        assert!(logs.contains("dropping row rejected by date rule"), "{logs}");
    }

    #[test]
    fn suffix_rule_runs_before_numeric_coercion() {
        let cfg = config("%Y%m");
        let input = table(&[("202012", "7"), ("202013", "n/a"), ("202101", "8")]);
        let out = clean_series("North", &input, &cfg).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out.rows()[0][0], month(2020, 12));
        assert_eq!(out.rows()[1][0], month(2021, 1));
        // The only non-numeric token was on the rejected row, so the numeric
        // column keeps its integer cells.
        assert_eq!(out.rows()[1][1], Value::Int(8));
    }

    #[test]
    fn no_remaining_date_matches_the_rule() {
        let cfg = config("%Y%m");
        let input = table(&[("201913", "1"), ("202001", "2"), ("202013", "3"), ("202002", "x")]);
        let out = clean_series("s", &input, &cfg).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0][0], month(2020, 1));
        assert!(out.column(1).all(|v| v.as_f64().is_some()));
    }

    #[test]
    fn unparsable_surviving_date_is_a_hard_error() {
        let cfg = config("%Y-%m");
        let input = table(&[("2020-05", "1"), ("May 2020", "2")]);
        let err = clean_series("West", &input, &cfg).unwrap_err();
        match err {
            PipelineError::DateParse { series, value, format } => {
                assert_eq!(series, "West");
                assert_eq!(value, "May 2020");
                assert_eq!(format, "%Y-%m");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_numeric_targets_are_dropped() {
        let cfg = config("%Y-%m");
        let input = table(&[("2020-01", "1"), ("2020-02", ""), ("2020-03", "3.5")]);
        let out = clean_series("s", &input, &cfg).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows()[1][1], Value::Float(3.5));
    }

    #[test]
    fn integer_dates_are_rendered_before_parsing() {
        let cfg = config("%Y%m");
        let input = Table::from_rows(
            vec!["period".into(), "value".into()],
            vec![vec![Value::Int(202003), Value::Int(5)]],
        )
        .unwrap();
        let out = clean_series("s", &input, &cfg).unwrap();
        assert_eq!(out.rows()[0][0], month(2020, 3));
    }

    #[test]
    fn clean_applies_to_every_series() {
        let cfg = config("%Y-%m");
        let mut set = SeriesSet::new();
        set.insert("a".into(), table(&[("2020-01", "1")]));
        set.insert("b".into(), table(&[("2020-01", "x")]));
        let out = clean(&set, &cfg).unwrap();
        assert_eq!(out["a"].len(), 1);
        assert!(out["b"].is_empty());
    }

    #[test]
    fn missing_target_column_is_configuration_error() {
        let cfg = config("%Y-%m");
        let input = Table::from_rows(vec!["period".into()], vec![vec![Value::infer("2020-01")]]).unwrap();
        assert!(matches!(
            clean_series("s", &input, &cfg),
            Err(PipelineError::Configuration(_))
        ));
    }
}
