//! Input/output helpers.
//!
//! - CSV / spreadsheet decoding into raw tables (`ingest`)
//! - forecast exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
