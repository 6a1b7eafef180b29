//! End-to-end run over one frame pair.
//!
//! ```text
//! reference, target → estimation → field → prediction → residual → reconstruction
//! ```

use crate::analysis::{FieldStatistics, ResidualStatistics};
use crate::capture::{Frame, SignedFrame};
use crate::error::MotionError;
use crate::estimation::{CostMetric, MotionEstimator, MotionField, SearchParams, SearchStrategy};
use crate::prediction::{BoundaryPolicy, FramePredictor};
use crate::residual::{compute_residual, reconstruct, reconstructs_exactly};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Estimated motion field.
    pub field: MotionField,
    /// Motion-compensated prediction.
    pub predicted: Frame,
    /// Target minus prediction.
    pub residual: SignedFrame,
    /// Prediction plus residual.
    pub reconstructed: Frame,
    /// Run summary.
    pub report: PipelineReport,
}

/// Serializable summary of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Sequence number of the reference frame.
    pub reference_sequence: u64,
    /// Sequence number of the target frame.
    pub target_sequence: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Block edge length.
    pub block_size: u32,
    /// Maximum displacement searched.
    pub search_range: i32,
    /// Search strategy used.
    pub strategy: SearchStrategy,
    /// Block cost metric used.
    pub metric: CostMetric,
    /// Boundary policy used.
    pub policy: BoundaryPolicy,
    /// Blocks in the field.
    pub blocks: usize,
    /// Displacements considered.
    pub candidates_visited: u64,
    /// Displacements inside the reference.
    pub candidates_evaluated: u64,
    /// Blocks with no valid candidate.
    pub fallback_blocks: usize,
    /// Blocks copied into the prediction.
    pub blocks_written: usize,
    /// Blocks left zero by the prediction.
    pub blocks_skipped: usize,
    /// Blocks with a zero vector.
    pub zero_vectors: usize,
    /// Mean displacement length.
    pub mean_vector_magnitude: f64,
    /// Sum of absolute residual samples.
    pub residual_sum_abs: u64,
    /// Mean squared residual.
    pub residual_mse: f64,
    /// Prediction PSNR, absent for a perfect prediction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual_psnr_db: Option<f64>,
    /// True if reconstruction matched the target.
    pub reconstruction_exact: bool,
    /// BLAKE3 digest of the motion field.
    pub field_digest: String,
    /// Estimation time in milliseconds.
    pub estimation_ms: f64,
    /// Wall time of the whole run in milliseconds.
    pub total_ms: f64,
}

impl PipelineReport {
    /// Renders the report as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

/// Estimation and prediction settings for one pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Block matching parameters.
    pub search: SearchParams,
    /// Boundary policy for prediction.
    pub policy: BoundaryPolicy,
}

/// Runs estimation, prediction, residual and reconstruction in order.
pub struct Pipeline {
    estimator: MotionEstimator,
    predictor: FramePredictor,
}

impl Pipeline {
    /// Creates a pipeline from `config`.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            estimator: MotionEstimator::new(config.search),
            predictor: FramePredictor::new(config.policy),
        }
    }

    /// Lets a caller stop estimation between blocks.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.estimator = self.estimator.with_cancel_flag(flag);
        self
    }

    /// Returns the search parameters.
    pub fn params(&self) -> &SearchParams {
        self.estimator.params()
    }

    /// Returns the boundary policy.
    pub fn policy(&self) -> BoundaryPolicy {
        self.predictor.policy()
    }

    /// Processes one reference/target pair.
    pub fn run(&self, reference: &Frame, target: &Frame) -> Result<PipelineOutput, MotionError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let params = self.estimator.params().clone();

        let estimate = self.estimator.estimate(reference, target)?;
        let estimation_ms = start.elapsed().as_secs_f64() * 1000.0;

        let prediction = self
            .predictor
            .predict(reference, &estimate.field, params.block_size)?;
        let residual = compute_residual(target, &prediction.frame)?;
        let reconstructed = reconstruct(&prediction.frame, &residual)?;

        let exact = reconstructs_exactly(target, &prediction.frame, &residual)
            && reconstructed == *target;
        if !exact {
            tracing::warn!(
                sequence = target.sequence(),
                "Reconstruction does not reproduce the target frame"
            );
        }

        let residual_stats = ResidualStatistics::analyze(&residual);
        let field_stats = FieldStatistics::analyze(&estimate.field);

        let report = PipelineReport {
            started_at,
            reference_sequence: reference.sequence(),
            target_sequence: target.sequence(),
            width: target.width(),
            height: target.height(),
            block_size: params.block_size,
            search_range: params.search_range,
            strategy: params.strategy,
            metric: params.metric,
            policy: self.predictor.policy(),
            blocks: estimate.stats.blocks,
            candidates_visited: estimate.stats.candidates_visited,
            candidates_evaluated: estimate.stats.candidates_evaluated,
            fallback_blocks: estimate.stats.fallback_blocks,
            blocks_written: prediction.blocks_written,
            blocks_skipped: prediction.blocks_skipped,
            zero_vectors: field_stats.zero_vectors,
            mean_vector_magnitude: field_stats.mean_magnitude,
            residual_sum_abs: residual_stats.sum_abs,
            residual_mse: residual_stats.mse,
            residual_psnr_db: residual_stats.psnr_db,
            reconstruction_exact: exact,
            field_digest: estimate.field.digest_hex(),
            estimation_ms,
            total_ms: start.elapsed().as_secs_f64() * 1000.0,
        };

        tracing::info!(
            reference = report.reference_sequence,
            target = report.target_sequence,
            blocks = report.blocks,
            moving = report.blocks - report.zero_vectors,
            mse = report.residual_mse,
            exact = report.reconstruction_exact,
            ms = report.total_ms,
            "Frame pair processed"
        );

        Ok(PipelineOutput {
            field: estimate.field,
            predicted: prediction.frame,
            residual,
            reconstructed,
            report,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
