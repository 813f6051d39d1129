//! Forecast orchestration.
//!
//! Responsibilities:
//!
//! - split each canonical series at the train cutoff
//! - drive one model fit / future frame / predict per series (parallel)
//! - keep only the prediction horizon and apply the failure policy

pub mod orchestrator;

pub use orchestrator::*;
