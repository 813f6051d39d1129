//! Data retrieval for the pipeline input.

pub mod source;

pub use source::*;
