//! Error types.
//!
//! Two layers:
//!
//! - [`PipelineError`] is the typed taxonomy raised by the pipeline stages.
//!   Series-scoped variants always carry the series name.
//! - [`AppError`] is what the binary reports: a message plus a process exit code.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::ModelOp;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures raised by the extract → prepare → forecast → report stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing/invalid configuration or a schema mismatch with the configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A date survived the invalid-date rule but does not match `date_format`.
    #[error("Series '{series}': date value '{value}' does not match format '{format}'")]
    DateParse {
        series: String,
        value: String,
        format: String,
    },

    /// The forecasting model rejected the series (fit, future frame or predict).
    #[error("Series '{series}': model {op} failed: {message}")]
    ModelFit {
        series: String,
        op: ModelOp,
        message: String,
    },

    /// The train cutoff excludes every observation of the series.
    #[error("Series '{series}': no observations at or before train cutoff {cutoff}")]
    EmptyTrainSet { series: String, cutoff: NaiveDateTime },

    /// The data source could not be fetched or decoded.
    #[error("Extraction failed: {0}")]
    Extract(String),

    /// Charts or exports could not be written.
    #[error("Report failed: {0}")]
    Report(String),
}

impl PipelineError {
    /// The series this error is scoped to, if any.
    pub fn series(&self) -> Option<&str> {
        match self {
            PipelineError::DateParse { series, .. }
            | PipelineError::ModelFit { series, .. }
            | PipelineError::EmptyTrainSet { series, .. } => Some(series),
            _ => None,
        }
    }

    /// Process exit code used when this error ends the run.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Configuration(_) => 2,
            PipelineError::DateParse { .. } | PipelineError::EmptyTrainSet { .. } => 3,
            PipelineError::ModelFit { .. } | PipelineError::Extract(_) | PipelineError::Report(_) => 4,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
