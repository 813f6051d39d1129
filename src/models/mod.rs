//! Forecasting models.
//!
//! The forecast stage only talks to models through the [`ForecastModel`]
//! capability (fit → future frame → predict), so any model with that shape
//! can be swapped in without touching orchestration.

use std::fmt;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::{CanonicalSeries, ForecastTable, Frequency};

pub mod trend;

pub use trend::*;

/// Which model operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOp {
    Fit,
    FutureFrame,
    Predict,
}

impl fmt::Display for ModelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelOp::Fit => "fit",
            ModelOp::FutureFrame => "future frame",
            ModelOp::Predict => "predict",
        })
    }
}

/// Failure reported by a model implementation.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ModelError(pub String);

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Fit / project / predict capability for a univariate time-series model.
pub trait ForecastModel: Sync {
    /// Opaque fitted-model handle.
    type Fitted;

    /// Fit on a non-empty `(ds, y)` training schedule.
    fn fit(&self, train: &CanonicalSeries) -> Result<Self::Fitted, ModelError>;

    /// Timestamps to predict: the training history followed by `periods`
    /// steps after the last training timestamp.
    fn future_frame(
        &self,
        fitted: &Self::Fitted,
        periods: usize,
        frequency: Frequency,
    ) -> Result<Vec<NaiveDateTime>, ModelError>;

    /// Point forecast and uncertainty interval for each timestamp.
    fn predict(&self, fitted: &Self::Fitted, future: &[NaiveDateTime]) -> Result<ForecastTable, ModelError>;
}
