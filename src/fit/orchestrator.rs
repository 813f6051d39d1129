//! Per-series forecasting loop.
//!
//! Each series moves through
//! `Unprocessed → TrainSplit → Fitted → FutureBuilt → Predicted → Done`,
//! or ends in `Failed` when the train split is empty or the model errors.
//! Series share no state, so they are forecast in parallel and merged into a
//! name-ordered map at the join point.

use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;

use crate::domain::{CanonicalSeries, FailurePolicy, ForecastTable, PipelineConfig};
use crate::error::PipelineError;
use crate::models::{ForecastModel, ModelOp};

/// Lifecycle of one series through the forecast stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesState {
    Unprocessed,
    TrainSplit,
    Fitted,
    FutureBuilt,
    Predicted,
    Done,
    Failed,
}

impl fmt::Display for SeriesState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeriesState::Unprocessed => "unprocessed",
            SeriesState::TrainSplit => "train-split",
            SeriesState::Fitted => "fitted",
            SeriesState::FutureBuilt => "future-built",
            SeriesState::Predicted => "predicted",
            SeriesState::Done => "done",
            SeriesState::Failed => "failed",
        })
    }
}

/// Forecast for one series.
#[derive(Debug, Clone)]
pub struct SeriesForecast {
    /// Observations at or before the train cutoff.
    pub train_rows: usize,
    /// Model output restricted to `ds >= prediction_start`.
    pub forecast: ForecastTable,
}

/// Result of the forecast stage.
///
/// Under `FailurePolicy::Abort` a returned outcome is always complete; under
/// `FailurePolicy::Continue` failed series are listed in `failures` and never
/// appear in `forecasts`.
#[derive(Debug, Default)]
pub struct ForecastOutcome {
    pub forecasts: BTreeMap<String, SeriesForecast>,
    pub failures: BTreeMap<String, PipelineError>,
}

impl ForecastOutcome {
    /// True when every input series produced a forecast.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Just the horizon tables, keyed by series name.
    pub fn tables(&self) -> BTreeMap<String, ForecastTable> {
        self.forecasts
            .iter()
            .map(|(name, f)| (name.clone(), f.forecast.clone()))
            .collect()
    }
}

/// Forecast every series with `model`.
///
/// With `FailurePolicy::Abort` the first failing series (in name order) is
/// returned as the error.
pub fn forecast_all<M: ForecastModel>(
    model: &M,
    series: &BTreeMap<String, CanonicalSeries>,
    config: &PipelineConfig,
) -> Result<ForecastOutcome, PipelineError> {
    let results: Vec<(String, Result<SeriesForecast, PipelineError>)> = series
        .par_iter()
        .map(|(name, s)| (name.clone(), forecast_series(model, name, s, config)))
        .collect();

    let mut outcome = ForecastOutcome::default();
    for (name, result) in results {
        match result {
            Ok(forecast) => {
                outcome.forecasts.insert(name, forecast);
            }
            Err(err) => match config.failure_policy {
                FailurePolicy::Abort => return Err(err),
                FailurePolicy::Continue => {
                    tracing::warn!(series = %name, error = %err, "series failed; continuing");
                    outcome.failures.insert(name, err);
                }
            },
        }
    }

    tracing::info!(
        forecasts = outcome.forecasts.len(),
        failures = outcome.failures.len(),
        "forecast stage finished"
    );
    Ok(outcome)
}

/// Forecast a single series.
pub fn forecast_series<M: ForecastModel>(
    model: &M,
    name: &str,
    series: &CanonicalSeries,
    config: &PipelineConfig,
) -> Result<SeriesForecast, PipelineError> {
    drive(model, name, series, config).1
}

/// Run one series to a terminal state (`Done` or `Failed`).
fn drive<M: ForecastModel>(
    model: &M,
    name: &str,
    series: &CanonicalSeries,
    config: &PipelineConfig,
) -> (SeriesState, Result<SeriesForecast, PipelineError>) {
    let mut state = SeriesState::Unprocessed;
    let result = run_series(model, name, series, config, &mut state);
    if let Err(err) = &result {
        tracing::debug!(series = name, error = %err, "series error");
        advance(name, &mut state, SeriesState::Failed);
    }
    (state, result)
}

fn run_series<M: ForecastModel>(
    model: &M,
    name: &str,
    series: &CanonicalSeries,
    config: &PipelineConfig,
    state: &mut SeriesState,
) -> Result<SeriesForecast, PipelineError> {
    let model_err = |op: ModelOp| {
        move |e: crate::models::ModelError| PipelineError::ModelFit {
            series: name.to_string(),
            op,
            message: e.to_string(),
        }
    };

    let train = series.until(config.max_train_date);
    advance(name, state, SeriesState::TrainSplit);
    if train.is_empty() {
        return Err(PipelineError::EmptyTrainSet {
            series: name.to_string(),
            cutoff: config.max_train_date,
        });
    }

    let fitted = model.fit(&train).map_err(model_err(ModelOp::Fit))?;
    advance(name, state, SeriesState::Fitted);

    let future = model
        .future_frame(&fitted, config.predict_periods, config.period_frequency)
        .map_err(model_err(ModelOp::FutureFrame))?;
    advance(name, state, SeriesState::FutureBuilt);

    let prediction = model
        .predict(&fitted, &future)
        .map_err(model_err(ModelOp::Predict))?;
    advance(name, state, SeriesState::Predicted);

    let forecast = prediction.since(config.prediction_start);
    advance(name, state, SeriesState::Done);

    Ok(SeriesForecast {
        train_rows: train.len(),
        forecast,
    })
}

fn advance(name: &str, state: &mut SeriesState, next: SeriesState) {
    tracing::debug!(series = name, from = %state, to = %next, "series state");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForecastRow, Frequency};
    use crate::models::{ModelError, TrendSeasonal};
    use chrono::{NaiveDate, NaiveDateTime};

    fn month(y: i32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn config(max_train: &str, start: &str, policy: &str) -> PipelineConfig {
        PipelineConfig::from_json_str(&format!(
            r#"{{
                "data_source": "data.csv",
                "description_column": "region",
                "date_column": "period",
                "date_format": "%Y-%m",
                "target_column": "value",
                "max_train_date": "{max_train}",
                "prediction_start": "{start}",
                "predict_periods": 6,
                "period_frequency": "MS",
                "on_series_error": "{policy}"
            }}"#
        ))
        .unwrap()
    }

    fn monthly(start_month: u32, values: &[f64]) -> CanonicalSeries {
        let ds = (0..values.len() as u32)
            .map(|i| {
                let m0 = start_month - 1 + i;
                month(2020 + (m0 / 12) as i32, m0 % 12 + 1)
            })
            .collect();
        CanonicalSeries::new(ds, values.to_vec()).unwrap()
    }

    /// Echoes the training mean; fails to fit series whose first value is negative.
    struct MeanModel;

    impl ForecastModel for MeanModel {
        type Fitted = (Vec<NaiveDateTime>, f64);

        fn fit(&self, train: &CanonicalSeries) -> Result<Self::Fitted, ModelError> {
            if train.y()[0] < 0.0 {
                return Err(ModelError::new("negative start"));
            }
            let mean = train.y().iter().sum::<f64>() / train.len() as f64;
            Ok((train.ds().to_vec(), mean))
        }

        fn future_frame(
            &self,
            fitted: &Self::Fitted,
            periods: usize,
            frequency: Frequency,
        ) -> Result<Vec<NaiveDateTime>, ModelError> {
            let mut frame = fitted.0.clone();
            let last = *frame.last().unwrap();
            frame.extend(frequency.steps_after(last, periods).unwrap());
            Ok(frame)
        }

        fn predict(&self, fitted: &Self::Fitted, future: &[NaiveDateTime]) -> Result<ForecastTable, ModelError> {
            Ok(ForecastTable::new(
                future
                    .iter()
                    .map(|&ds| ForecastRow {
                        ds,
                        yhat: fitted.1,
                        yhat_lower: fitted.1 - 1.0,
                        yhat_upper: fitted.1 + 1.0,
                    })
                    .collect(),
            ))
        }
    }

    #[test]
    fn forecast_rows_start_at_prediction_start() {
        let cfg = config("2020-06", "2020-07", "abort");
        let mut set = BTreeMap::new();
        set.insert("North".to_string(), monthly(1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]));
        set.insert("South".to_string(), monthly(3, &[10.0, 10.0, 10.0, 10.0]));

        let outcome = forecast_all(&TrendSeasonal::default(), &set, &cfg).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.forecasts.len(), 2);

        let north = &outcome.forecasts["North"];
        assert_eq!(north.train_rows, 6);
        assert_eq!(north.forecast.len(), 6);
        assert_eq!(north.forecast.first().unwrap().ds, month(2020, 7));
        assert_eq!(north.forecast.last().unwrap().ds, month(2020, 12));
        for f in outcome.forecasts.values() {
            assert!(f.forecast.rows.iter().all(|r| r.ds >= cfg.prediction_start));
        }
    }

    #[test]
    fn prediction_start_before_cutoff_keeps_overlap() {
        let cfg = config("2020-06", "2020-04", "abort");
        let series = monthly(1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let out = forecast_series(&MeanModel, "s", &series, &cfg).unwrap();
        // April..June from history plus six projected months.
        assert_eq!(out.forecast.len(), 9);
        assert_eq!(out.forecast.first().unwrap().ds, month(2020, 4));
    }

    #[test]
    fn all_rows_after_cutoff_is_empty_train_error() {
        let cfg = config("2020-06", "2020-07", "abort");
        let series = monthly(8, &[1.0, 2.0]);
        match forecast_series(&MeanModel, "Late", &series, &cfg) {
            Err(PipelineError::EmptyTrainSet { series, cutoff }) => {
                assert_eq!(series, "Late");
                assert_eq!(cutoff, month(2020, 6));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn fit_failure_names_the_series() {
        let cfg = config("2020-06", "2020-07", "abort");
        let series = monthly(1, &[-1.0, 2.0]);
        match forecast_series(&MeanModel, "Neg", &series, &cfg) {
            Err(PipelineError::ModelFit { series, op, message }) => {
                assert_eq!(series, "Neg");
                assert_eq!(op, ModelOp::Fit);
                assert_eq!(message, "negative start");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn abort_policy_fails_the_run() {
        let cfg = config("2020-06", "2020-07", "abort");
        let mut set = BTreeMap::new();
        set.insert("a".to_string(), monthly(1, &[1.0, 2.0]));
        set.insert("b".to_string(), monthly(1, &[-1.0, 2.0]));
        let err = forecast_all(&MeanModel, &set, &cfg).unwrap_err();
        assert_eq!(err.series(), Some("b"));
    }

    #[test]
    fn continue_policy_separates_failures() {
        let cfg = config("2020-06", "2020-07", "continue");
        let mut set = BTreeMap::new();
        set.insert("a".to_string(), monthly(1, &[1.0, 2.0]));
        set.insert("b".to_string(), monthly(1, &[-1.0, 2.0]));
        set.insert("c".to_string(), monthly(9, &[1.0]));

        let outcome = forecast_all(&MeanModel, &set, &cfg).unwrap();
        assert!(!outcome.is_complete());
        assert_eq!(outcome.forecasts.keys().collect::<Vec<_>>(), vec!["a"]);
        assert!(matches!(outcome.failures["b"], PipelineError::ModelFit { .. }));
        assert!(matches!(outcome.failures["c"], PipelineError::EmptyTrainSet { .. }));
        // Jan/Feb history plus Mar..Aug projected; the horizon keeps Jul and Aug.
        assert_eq!(outcome.tables()["a"].len(), 2);
    }

    #[test]
    fn series_end_in_a_terminal_state() {
        let cfg = config("2020-06", "2020-07", "abort");
        let (state, result) = drive(&MeanModel, "ok", &monthly(1, &[1.0, 2.0]), &cfg);
        assert_eq!(state, SeriesState::Done);
        assert!(result.is_ok());

        let (state, result) = drive(&MeanModel, "late", &monthly(8, &[1.0]), &cfg);
        assert_eq!(state, SeriesState::Failed);
        assert!(result.is_err());

        let (state, _) = drive(&MeanModel, "neg", &monthly(1, &[-1.0]), &cfg);
        assert_eq!(state, SeriesState::Failed);
    }

    #[test]
    fn future_frame_past_calendar_range_is_model_error() {
        let mut cfg = config("2020-06", "2020-07", "abort");
        cfg.max_train_date = NaiveDateTime::MAX;
        cfg.period_frequency = Frequency::Daily;
        let last = NaiveDate::MAX.and_hms_opt(0, 0, 0).unwrap();
        let series = CanonicalSeries::new(vec![last], vec![1.0]).unwrap();

        match forecast_series(&TrendSeasonal::default(), "Edge", &series, &cfg) {
            Err(PipelineError::ModelFit { series, op, .. }) => {
                assert_eq!(series, "Edge");
                assert_eq!(op, ModelOp::FutureFrame);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
