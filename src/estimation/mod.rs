//! Block motion estimation.
//!
//! Splits the target frame into `block_size` tiles and finds, for each
//! tile, the displacement into the reference frame with the lowest block
//! cost. Blocks are independent units of work: they are searched on a
//! rayon pool and gathered back by index, so the output is the same
//! raster-ordered field regardless of thread count.

mod cost;
mod diamond;
mod field;
mod full_search;
mod params;

pub use cost::{BlockCost, CostMetric, SumAbsDiff, SumSquaredDiff};
pub use diamond::diamond_search;
pub use field::{block_origins, MotionField, MotionVector};
pub use full_search::{full_search, BlockMatch};
pub use params::{SearchParams, SearchStrategy};

use crate::capture::Frame;
use crate::error::{MotionError, ParameterError};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Counters accumulated over one estimation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Blocks searched.
    pub blocks: usize,
    /// Candidate displacements visited.
    pub candidates_visited: u64,
    /// Candidates whose reference block lay inside the frame.
    pub candidates_evaluated: u64,
    /// Blocks that had no valid candidate and kept the zero vector.
    pub fallback_blocks: usize,
    /// Sum of the winning block costs.
    pub total_cost: u64,
}

impl SearchStats {
    fn from_matches(matches: &[BlockMatch]) -> Self {
        matches.iter().fold(Self::default(), |mut stats, m| {
            stats.blocks += 1;
            stats.candidates_visited += m.visited;
            stats.candidates_evaluated += m.evaluated;
            stats.total_cost += m.cost.unwrap_or(0);
            if m.is_fallback() {
                stats.fallback_blocks += 1;
            }
            stats
        })
    }
}

/// A motion field together with the statistics of the run that built it.
#[derive(Debug, Clone)]
pub struct Estimate {
    /// Displacement of every block.
    pub field: MotionField,
    /// Search counters.
    pub stats: SearchStats,
}

/// Motion estimator configured with fixed search parameters.
pub struct MotionEstimator {
    params: SearchParams,
    cancel: Option<Arc<AtomicBool>>,
    /// Dedicated workers for `threads > 1`, built on first use.
    pool: OnceLock<Result<ThreadPool, String>>,
}

impl MotionEstimator {
    /// Creates an estimator with the given parameters.
    pub fn new(params: SearchParams) -> Self {
        Self {
            params,
            cancel: None,
            pool: OnceLock::new(),
        }
    }

    /// Checks `flag` before every block and stops once it is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Returns the search parameters.
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Validates parameters and frames before any search begins.
    pub fn validate(&self, reference: &Frame, target: &Frame) -> Result<(), ParameterError> {
        self.params.validate()?;
        reference.check()?;
        target.check()?;
        if !reference.same_dimensions(target) {
            return Err(ParameterError::FrameSizeMismatch {
                reference_width: reference.width(),
                reference_height: reference.height(),
                target_width: target.width(),
                target_height: target.height(),
            });
        }
        self.params
            .check_frame_size(reference.width(), reference.height())
    }

    /// Computes the motion field of `target` relative to `reference`.
    pub fn estimate(&self, reference: &Frame, target: &Frame) -> Result<Estimate, MotionError> {
        self.validate(reference, target)?;

        let (width, height) = (reference.width(), reference.height());
        let block_size = self.params.block_size;
        let origins: Vec<(u32, u32)> = block_origins(width, height, block_size).collect();
        let total = origins.len();

        tracing::debug!(
            width,
            height,
            block_size,
            search_range = self.params.search_range,
            strategy = %self.params.strategy,
            metric = %self.params.metric,
            blocks = total,
            "Starting motion estimation"
        );

        let results = self.run_blocks(reference, target, &origins)?;

        let completed = results.iter().filter(|r| r.is_some()).count();
        if completed < total {
            tracing::warn!(completed, total, "Motion estimation cancelled");
            return Err(MotionError::Cancelled { completed, total });
        }

        let matches: Vec<BlockMatch> = results.into_iter().flatten().collect();
        let stats = SearchStats::from_matches(&matches);
        let vectors = matches.into_iter().map(|m| m.vector).collect();
        let field = MotionField::new(width, height, block_size, vectors);

        tracing::debug!(
            visited = stats.candidates_visited,
            evaluated = stats.candidates_evaluated,
            fallback = stats.fallback_blocks,
            "Motion estimation finished"
        );

        Ok(Estimate { field, stats })
    }

    /// Searches every block, leaving `None` for blocks skipped after cancellation.
    fn run_blocks(
        &self,
        reference: &Frame,
        target: &Frame,
        origins: &[(u32, u32)],
    ) -> Result<Vec<Option<BlockMatch>>, MotionError> {
        let search = |&(x, y): &(u32, u32)| self.search_block(reference, target, x, y);

        match self.params.threads {
            1 => Ok(origins.iter().map(search).collect()),
            0 => Ok(origins.par_iter().map(search).collect()),
            threads => {
                let pool = self.worker_pool(threads)?;
                Ok(pool.install(|| origins.par_iter().map(search).collect()))
            }
        }
    }

    /// Returns the dedicated pool, building it on the first call.
    fn worker_pool(&self, threads: usize) -> Result<&ThreadPool, MotionError> {
        self.pool
            .get_or_init(|| {
                tracing::debug!(threads, "Building motion estimation worker pool");
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|idx| format!("me-{}", idx))
                    .build()
                    .map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| MotionError::WorkerPool(e.clone()))
    }

    fn search_block(&self, reference: &Frame, target: &Frame, x: u32, y: u32) -> Option<BlockMatch> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return None;
        }

        let SearchParams {
            block_size,
            search_range,
            strategy,
            metric,
            ..
        } = self.params;
        let cost = metric.evaluator();

        let found = match strategy {
            SearchStrategy::Full => {
                full_search(reference, target, x, y, block_size, search_range, cost)
            }
            SearchStrategy::Diamond => {
                diamond_search(reference, target, x, y, block_size, search_range, cost)
            }
        };

        tracing::trace!(
            x,
            y,
            dx = found.vector.dx,
            dy = found.vector.dy,
            cost = ?found.cost,
            "Block matched"
        );
        Some(found)
    }
}

impl Default for MotionEstimator {
    fn default() -> Self {
        Self::new(SearchParams::default())
    }
}

/// Full-search SAD motion estimation of `target` against `reference`.
///
/// Fails with [`MotionError::InvalidParameter`] if `block_size` is zero,
/// `search_range` is negative, the frames differ in size, or a block
/// does not fit inside the frames.
pub fn estimate_motion(
    reference: &Frame,
    target: &Frame,
    block_size: u32,
    search_range: i32,
) -> Result<MotionField, MotionError> {
    MotionEstimator::new(SearchParams::new(block_size, search_range))
        .estimate(reference, target)
        .map(|estimate| estimate.field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(width: u32, height: u32) -> Frame {
        Frame::from_fn(width, height, |x, y| {
            ((x * 37 + y * 91 + x * y * 13) % 251) as u8
        })
    }

    #[test]
    fn test_scale_example() {
        let reference = texture(32, 32);
        let target = texture(32, 32);

        let estimate = MotionEstimator::new(SearchParams::new(16, 8))
            .estimate(&reference, &target)
            .unwrap();

        let origins: Vec<(u32, u32)> = estimate.field.iter().map(|mv| (mv.x, mv.y)).collect();
        assert_eq!(origins, vec![(0, 0), (16, 0), (0, 16), (16, 16)]);
        assert_eq!(estimate.stats.blocks, 4);
        assert_eq!(estimate.stats.candidates_visited, 4 * 289);
        // Each corner block can only move 0..=8 towards the centre on each axis.
        assert_eq!(estimate.stats.candidates_evaluated, 4 * 81);
        assert_eq!(estimate.stats.fallback_blocks, 0);
    }

    #[test]
    fn test_rejects_zero_block_size() {
        let frame = texture(16, 16);
        let err = estimate_motion(&frame, &frame, 0, 4).unwrap_err();
        assert!(matches!(
            err,
            MotionError::InvalidParameter(ParameterError::ZeroBlockSize)
        ));
    }

    #[test]
    fn test_rejects_negative_range() {
        let frame = texture(16, 16);
        assert!(estimate_motion(&frame, &frame, 8, -2)
            .unwrap_err()
            .is_invalid_parameter());
    }

    #[test]
    fn test_rejects_block_larger_than_frame() {
        let frame = texture(10, 32);
        assert!(matches!(
            estimate_motion(&frame, &frame, 16, 8),
            Err(MotionError::InvalidParameter(
                ParameterError::BlockExceedsFrame { .. }
            ))
        ));
    }

    #[test]
    fn test_rejects_mismatched_frames() {
        let a = texture(32, 32);
        let b = texture(32, 16);
        assert!(matches!(
            estimate_motion(&a, &b, 8, 2),
            Err(MotionError::InvalidParameter(
                ParameterError::FrameSizeMismatch { .. }
            ))
        ));
    }

    #[test]
    fn test_rejects_malformed_frame() {
        let a = texture(8, 8);
        let b = Frame::new(vec![0; 10], 8, 8, 0);
        assert!(estimate_motion(&a, &b, 4, 1)
            .unwrap_err()
            .is_invalid_parameter());
    }

    #[test]
    fn test_zero_motion_identity() {
        let frame = texture(40, 24);
        let field = estimate_motion(&frame, &frame, 8, 3).unwrap();
        assert_eq!(field.len(), 15);
        assert!(field.iter().all(MotionVector::is_zero));
    }

    #[test]
    fn test_thread_count_does_not_change_field() {
        let reference = texture(64, 48);
        let target = Frame::from_fn(64, 48, |x, y| reference.get((x + 2) % 64, (y + 1) % 48));

        let sequential = MotionEstimator::new(SearchParams::new(8, 4).with_threads(1))
            .estimate(&reference, &target)
            .unwrap();
        let shared = MotionEstimator::new(SearchParams::new(8, 4))
            .estimate(&reference, &target)
            .unwrap();
        let dedicated = MotionEstimator::new(SearchParams::new(8, 4).with_threads(3))
            .estimate(&reference, &target)
            .unwrap();

        assert_eq!(sequential.field, shared.field);
        assert_eq!(sequential.field, dedicated.field);
        assert_eq!(sequential.stats, dedicated.stats);
    }

    #[test]
    fn test_dedicated_pool_reused_across_runs() {
        let reference = texture(32, 32);
        let estimator = MotionEstimator::new(SearchParams::new(8, 2).with_threads(3));

        let first = estimator.estimate(&reference, &reference).unwrap();
        let pool = estimator.worker_pool(3).unwrap() as *const ThreadPool;
        let second = estimator.estimate(&reference, &reference).unwrap();

        assert_eq!(first.field, second.field);
        assert!(std::ptr::eq(pool, estimator.worker_pool(3).unwrap()));
        assert_eq!(estimator.worker_pool(3).unwrap().current_num_threads(), 3);
    }

    #[test]
    fn test_partial_edge_blocks_get_vectors() {
        let frame = texture(20, 20);
        let estimate = MotionEstimator::new(SearchParams::new(16, 2))
            .estimate(&frame, &frame)
            .unwrap();

        assert_eq!(estimate.field.len(), 4);
        // Only the top-left block can hold a full-size candidate.
        assert_eq!(estimate.stats.fallback_blocks, 3);
        assert!(estimate.field.iter().all(MotionVector::is_zero));
    }

    #[test]
    fn test_cancelled_before_start() {
        let frame = texture(32, 32);
        let flag = Arc::new(AtomicBool::new(true));
        let estimator = MotionEstimator::new(SearchParams::new(8, 2)).with_cancel_flag(flag);

        assert!(matches!(
            estimator.estimate(&frame, &frame),
            Err(MotionError::Cancelled {
                completed: 0,
                total: 16
            })
        ));
    }

    #[test]
    fn test_ssd_metric_finds_same_shift() {
        let reference = texture(48, 48);
        let target = Frame::from_fn(48, 48, |x, y| {
            reference.get((x + 1).min(47), y.saturating_sub(2))
        });

        let field = MotionEstimator::new(SearchParams::new(16, 3).with_metric(CostMetric::Ssd))
            .estimate(&reference, &target)
            .unwrap()
            .field;
        assert_eq!(field.get(1, 1).map(|mv| (mv.dx, mv.dy)), Some((1, -2)));
    }
}
