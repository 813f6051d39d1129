//! Linear trend + yearly Fourier seasonality, fitted by least squares.
//!
//! `y(t) = β0 + β1·t/scale + Σ_k (a_k sin(2πk·t/P) + b_k cos(2πk·t/P))`
//!
//! with `t` in days since the first training timestamp and `P` one year.
//! Yearly terms are only used once the history spans two years, and their
//! order is reduced until the design has fewer columns than observations.
//!
//! The uncertainty interval is `yhat ± z·σ`, where `σ` is the residual
//! standard deviation and `z` the normal quantile for `interval_width`.

use chrono::NaiveDateTime;

use crate::domain::{CanonicalSeries, ForecastRow, ForecastTable, Frequency};
use crate::math::{YEAR_DAYS, fill_fourier_terms, fit_least_squares, interval_z};
use crate::models::{ForecastModel, ModelError};

/// Minimum history (days) before yearly seasonality is modelled.
const MIN_SEASONAL_SPAN_DAYS: f64 = 2.0 * 365.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone)]
pub struct TrendSeasonal {
    /// Coverage of the prediction interval, in (0, 1).
    pub interval_width: f64,
    /// Upper bound on the yearly Fourier order.
    pub yearly_order: usize,
}

impl Default for TrendSeasonal {
    fn default() -> Self {
        Self {
            interval_width: 0.8,
            yearly_order: 3,
        }
    }
}

impl TrendSeasonal {
    pub fn new(interval_width: f64) -> Self {
        Self {
            interval_width,
            ..Self::default()
        }
    }
}

/// Fitted coefficients and the training timestamps.
#[derive(Debug, Clone)]
pub struct TrendSeasonalFit {
    origin: NaiveDateTime,
    scale_days: f64,
    yearly_order: usize,
    betas: Vec<f64>,
    sigma: f64,
    z: f64,
    history: Vec<NaiveDateTime>,
}

impl TrendSeasonalFit {
    pub fn betas(&self) -> &[f64] {
        &self.betas
    }

    /// Residual standard deviation.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn yearly_order(&self) -> usize {
        self.yearly_order
    }

    fn design_row(&self, ts: NaiveDateTime) -> Vec<f64> {
        design_row(ts, self.origin, self.scale_days, self.yearly_order)
    }
}

impl ForecastModel for TrendSeasonal {
    type Fitted = TrendSeasonalFit;

    fn fit(&self, train: &CanonicalSeries) -> Result<TrendSeasonalFit, ModelError> {
        let n = train.len();
        let (Some(&origin), Some(&last)) = (train.ds().iter().min(), train.ds().iter().max()) else {
            return Err(ModelError::new("cannot fit on an empty training set"));
        };
        let z = interval_z(self.interval_width).ok_or_else(|| {
            ModelError::new(format!("invalid interval width {}", self.interval_width))
        })?;

        let span_days = days_between(origin, last);
        let scale_days = if span_days > 0.0 { span_days } else { 1.0 };

        let mut yearly_order = if span_days >= MIN_SEASONAL_SPAN_DAYS {
            self.yearly_order
        } else {
            0
        };
        while yearly_order > 0 && n <= 2 + 2 * yearly_order {
            yearly_order -= 1;
        }

        let design: Vec<Vec<f64>> = train
            .ds()
            .iter()
            .map(|&ts| design_row(ts, origin, scale_days, yearly_order))
            .collect();
        let fit = fit_least_squares(&design, train.y())
            .ok_or_else(|| ModelError::new("least squares solve failed (ill-conditioned design)"))?;

        let dof = n.saturating_sub(design[0].len()).max(1);
        let sigma = (fit.sse / dof as f64).sqrt();

        let mut history = train.ds().to_vec();
        history.sort();
        history.dedup();

        Ok(TrendSeasonalFit {
            origin,
            scale_days,
            yearly_order,
            betas: fit.betas,
            sigma,
            z,
            history,
        })
    }

    fn future_frame(
        &self,
        fitted: &TrendSeasonalFit,
        periods: usize,
        frequency: Frequency,
    ) -> Result<Vec<NaiveDateTime>, ModelError> {
        let last = *fitted
            .history
            .last()
            .ok_or_else(|| ModelError::new("fitted model has no history"))?;
        let steps = frequency.steps_after(last, periods).ok_or_else(|| {
            ModelError::new(format!(
                "{periods} {frequency} periods after {last} leave the supported date range"
            ))
        })?;
        let mut frame = fitted.history.clone();
        frame.extend(steps);
        Ok(frame)
    }

    fn predict(&self, fitted: &TrendSeasonalFit, future: &[NaiveDateTime]) -> Result<ForecastTable, ModelError> {
        let half_width = fitted.z * fitted.sigma;
        let mut rows = Vec::with_capacity(future.len());
        for &ds in future {
            let yhat: f64 = fitted
                .design_row(ds)
                .iter()
                .zip(fitted.betas.iter())
                .map(|(x, b)| x * b)
                .sum();
            if !yhat.is_finite() {
                return Err(ModelError::new(format!("non-finite prediction at {ds}")));
            }
            rows.push(ForecastRow {
                ds,
                yhat,
                yhat_lower: yhat - half_width,
                yhat_upper: yhat + half_width,
            });
        }
        Ok(ForecastTable::new(rows))
    }
}

fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / SECONDS_PER_DAY
}

fn design_row(ts: NaiveDateTime, origin: NaiveDateTime, scale_days: f64, yearly_order: usize) -> Vec<f64> {
    let t_days = days_between(origin, ts);
    let mut row = vec![0.0; 2 + 2 * yearly_order];
    row[0] = 1.0;
    row[1] = t_days / scale_days;
    fill_fourier_terms(t_days, YEAR_DAYS, yearly_order, &mut row[2..]);
    row
}
