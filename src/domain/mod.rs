//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - untyped raw tables and the named series set (`Table`, `Value`, `SeriesSet`)
//! - the canonical `(ds, y)` schedule and forecast output (`CanonicalSeries`, `ForecastTable`)
//! - run configuration (`PipelineConfig`, `DateRule`, `FailurePolicy`, `Frequency`)

pub mod config;
pub mod frequency;
pub mod series;
pub mod table;

pub use config::*;
pub use frequency::*;
pub use series::*;
pub use table::*;
