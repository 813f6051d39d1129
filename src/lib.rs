//! `series-forecast` library crate.
//!
//! The binary (`sf`) is a thin wrapper around this library so the pipeline
//! stages are testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod prep;
pub mod report;
