//! Search parameters, fixed for one estimation run.

use super::cost::CostMetric;
use crate::error::ParameterError;
use serde::{Deserialize, Serialize};

/// How candidate displacements are explored for each block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Every displacement in the window, in ascending `(dy, dx)` order.
    #[default]
    Full,
    /// Large then small diamond descent from the zero displacement.
    Diamond,
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStrategy::Full => f.write_str("full"),
            SearchStrategy::Diamond => f.write_str("diamond"),
        }
    }
}

/// Parameters for one motion estimation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchParams {
    /// Edge length of the square blocks.
    pub block_size: u32,
    /// Maximum displacement on each axis, in pixels.
    pub search_range: i32,
    /// Candidate exploration order.
    pub strategy: SearchStrategy,
    /// Block similarity metric.
    pub metric: CostMetric,
    /// Worker threads: 0 uses the shared pool, 1 runs inline.
    pub threads: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            block_size: 16,
            search_range: 8,
            strategy: SearchStrategy::Full,
            metric: CostMetric::Sad,
            threads: 0,
        }
    }
}

impl SearchParams {
    /// Creates full-search SAD parameters.
    pub fn new(block_size: u32, search_range: i32) -> Self {
        Self {
            block_size,
            search_range,
            ..Default::default()
        }
    }

    /// Sets the search strategy.
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the block cost metric.
    pub fn with_metric(mut self, metric: CostMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the worker thread count, 0 for the shared rayon pool.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Number of candidates in the square window, `(2r + 1)^2`.
    pub fn window_size(&self) -> u64 {
        let side = 2 * self.search_range.max(0) as u64 + 1;
        side * side
    }

    /// Checks the parameters on their own.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.block_size == 0 {
            return Err(ParameterError::ZeroBlockSize);
        }
        if self.search_range < 0 {
            return Err(ParameterError::NegativeSearchRange(self.search_range));
        }
        Ok(())
    }

    /// Checks that a block fits inside a `width × height` frame.
    pub fn check_frame_size(&self, width: u32, height: u32) -> Result<(), ParameterError> {
        if self.block_size > width || self.block_size > height {
            return Err(ParameterError::BlockExceedsFrame {
                block_size: self.block_size,
                width,
                height,
            });
        }
        Ok(())
    }
}
