//! Reporting: terminal summaries and per-series HTML charts.

pub mod chart;
pub mod format;

pub use chart::*;
pub use format::*;
