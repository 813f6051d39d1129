//! Mathematical utilities: basis functions, least squares, and normal quantiles.

pub mod basis;
pub mod ols;
pub mod stats;

pub use basis::*;
pub use ols::*;
pub use stats::*;
