//! Block similarity metrics.
//!
//! The search loops only ever ask "how far apart are these two blocks",
//! so a metric can be swapped without touching them.

use crate::capture::Block;
use serde::{Deserialize, Serialize};

/// A similarity cost between two equally shaped blocks. Lower is closer.
pub trait BlockCost: Send + Sync {
    /// Short metric name for logs and reports.
    fn name(&self) -> &'static str;

    /// Computes the cost of matching `target` with `reference`.
    ///
    /// Both blocks must have the same shape.
    fn cost(&self, reference: &Block<'_>, target: &Block<'_>) -> u64;
}

/// Sum of absolute differences.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumAbsDiff;

impl BlockCost for SumAbsDiff {
    fn name(&self) -> &'static str {
        "sad"
    }

    fn cost(&self, reference: &Block<'_>, target: &Block<'_>) -> u64 {
        debug_assert!(reference.same_shape(target), "block shapes differ");
        reference
            .rows()
            .zip(target.rows())
            .map(|(r, t)| {
                r.iter()
                    .zip(t)
                    .map(|(&a, &b)| a.abs_diff(b) as u64)
                    .sum::<u64>()
            })
            .sum()
    }
}

/// Sum of squared differences.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumSquaredDiff;

impl BlockCost for SumSquaredDiff {
    fn name(&self) -> &'static str {
        "ssd"
    }

    fn cost(&self, reference: &Block<'_>, target: &Block<'_>) -> u64 {
        debug_assert!(reference.same_shape(target), "block shapes differ");
        reference
            .rows()
            .zip(target.rows())
            .map(|(r, t)| {
                r.iter()
                    .zip(t)
                    .map(|(&a, &b)| {
                        let d = a.abs_diff(b) as u64;
                        d * d
                    })
                    .sum::<u64>()
            })
            .sum()
    }
}

/// Runtime selection of a [`BlockCost`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostMetric {
    /// Sum of absolute differences.
    #[default]
    Sad,
    /// Sum of squared differences.
    Ssd,
}

impl CostMetric {
    /// Returns the evaluator for this metric.
    pub fn evaluator(self) -> &'static dyn BlockCost {
        match self {
            CostMetric::Sad => &SumAbsDiff,
            CostMetric::Ssd => &SumSquaredDiff,
        }
    }
}

impl std::fmt::Display for CostMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.evaluator().name())
    }
}
