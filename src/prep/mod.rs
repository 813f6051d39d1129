//! Series preparation: raw table → named, cleaned, canonical series.
//!
//! Stages run in a fixed order and each returns a new `SeriesSet`:
//!
//! 1. `partition`: split the raw table by the grouping column
//! 2. `clean`: validate dates and coerce the target to numbers
//! 3. `normalize`: narrow to the `ds, y` schedule

pub mod clean;
pub mod normalize;
pub mod partition;

pub use clean::*;
pub use normalize::*;
pub use partition::*;
