//! Residual and motion-field statistics.

mod statistics;

pub use statistics::{FieldStatistics, ResidualStatistics};
