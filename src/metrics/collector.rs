//! Metrics collection and registry.

use crate::pipeline::PipelineReport;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Metric registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Per-run values fed into the registry.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Blocks searched in this run.
    pub blocks: u64,
    /// Candidate displacements visited.
    pub candidates_visited: u64,
    /// Candidates inside the reference frame.
    pub candidates_evaluated: u64,
    /// Blocks that kept the zero vector for lack of candidates.
    pub fallback_blocks: u64,
    /// Blocks written by the predictor.
    pub blocks_written: u64,
    /// Blocks left zero by the boundary policy.
    pub blocks_skipped: u64,
    /// Residual mean squared error.
    pub residual_mse: f64,
    /// Residual PSNR, absent for a zero residual.
    pub residual_psnr_db: Option<f64>,
    /// Mean motion vector length.
    pub mean_vector_magnitude: f64,
    /// Whether prediction plus residual reproduced the target.
    pub reconstruction_exact: bool,
    /// Time spent in estimation, in seconds.
    pub estimation_seconds: f64,
}

impl From<&PipelineReport> for MetricsSnapshot {
    fn from(report: &PipelineReport) -> Self {
        Self {
            blocks: report.blocks as u64,
            candidates_visited: report.candidates_visited,
            candidates_evaluated: report.candidates_evaluated,
            fallback_blocks: report.fallback_blocks as u64,
            blocks_written: report.blocks_written as u64,
            blocks_skipped: report.blocks_skipped as u64,
            residual_mse: report.residual_mse,
            residual_psnr_db: report.residual_psnr_db,
            mean_vector_magnitude: report.mean_vector_magnitude,
            reconstruction_exact: report.reconstruction_exact,
            estimation_seconds: report.estimation_ms / 1000.0,
        }
    }
}

/// Prometheus metrics registry for the motion pipeline.
pub struct MetricsRegistry {
    registry: Registry,

    // Run counters
    runs_total: IntCounter,
    blocks_total: IntCounter,
    candidates_visited_total: IntCounter,
    candidates_evaluated_total: IntCounter,
    fallback_blocks_total: IntCounter,

    // Prediction counters
    predicted_blocks_total: IntCounter,
    skipped_blocks_total: IntCounter,

    // Last-run gauges
    residual_mse: Gauge,
    residual_psnr_db: Gauge,
    mean_vector_magnitude: Gauge,
    reconstruction_exact: IntGauge,
    estimation_seconds: Gauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all pipeline metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let runs_total = IntCounter::new(
            "block_motion_runs_total",
            "Frame pairs processed",
        )?;
        let blocks_total = IntCounter::new(
            "block_motion_blocks_total",
            "Blocks searched by motion estimation",
        )?;
        let candidates_visited_total = IntCounter::new(
            "block_motion_candidates_visited_total",
            "Candidate displacements visited",
        )?;
        let candidates_evaluated_total = IntCounter::new(
            "block_motion_candidates_evaluated_total",
            "Candidate displacements whose reference block was inside the frame",
        )?;
        let fallback_blocks_total = IntCounter::new(
            "block_motion_fallback_blocks_total",
            "Blocks with no valid candidate that kept the zero vector",
        )?;

        let predicted_blocks_total = IntCounter::new(
            "block_motion_predicted_blocks_total",
            "Blocks written by the frame predictor",
        )?;
        let skipped_blocks_total = IntCounter::new(
            "block_motion_skipped_blocks_total",
            "Blocks left zero by the boundary policy",
        )?;

        let residual_mse = Gauge::new(
            "block_motion_residual_mse",
            "Mean squared residual of the last run",
        )?;
        let residual_psnr_db = Gauge::new(
            "block_motion_residual_psnr_db",
            "Residual PSNR of the last run (dB)",
        )?;
        let mean_vector_magnitude = Gauge::new(
            "block_motion_mean_vector_magnitude",
            "Mean motion vector length of the last run",
        )?;
        let reconstruction_exact = IntGauge::new(
            "block_motion_reconstruction_exact",
            "Whether the last reconstruction matched the target (1=yes, 0=no)",
        )?;
        let estimation_seconds = Gauge::new(
            "block_motion_estimation_seconds",
            "Wall time of the last motion estimation",
        )?;

        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(blocks_total.clone()))?;
        registry.register(Box::new(candidates_visited_total.clone()))?;
        registry.register(Box::new(candidates_evaluated_total.clone()))?;
        registry.register(Box::new(fallback_blocks_total.clone()))?;
        registry.register(Box::new(predicted_blocks_total.clone()))?;
        registry.register(Box::new(skipped_blocks_total.clone()))?;
        registry.register(Box::new(residual_mse.clone()))?;
        registry.register(Box::new(residual_psnr_db.clone()))?;
        registry.register(Box::new(mean_vector_magnitude.clone()))?;
        registry.register(Box::new(reconstruction_exact.clone()))?;
        registry.register(Box::new(estimation_seconds.clone()))?;

        Ok(Self {
            registry,
            runs_total,
            blocks_total,
            candidates_visited_total,
            candidates_evaluated_total,
            fallback_blocks_total,
            predicted_blocks_total,
            skipped_blocks_total,
            residual_mse,
            residual_psnr_db,
            mean_vector_magnitude,
            reconstruction_exact,
            estimation_seconds,
        })
    }

    /// Adds one run to the counters and replaces the last-run gauges.
    pub fn record(&self, snapshot: &MetricsSnapshot) {
        self.runs_total.inc();
        self.blocks_total.inc_by(snapshot.blocks);
        self.candidates_visited_total
            .inc_by(snapshot.candidates_visited);
        self.candidates_evaluated_total
            .inc_by(snapshot.candidates_evaluated);
        self.fallback_blocks_total.inc_by(snapshot.fallback_blocks);
        self.predicted_blocks_total.inc_by(snapshot.blocks_written);
        self.skipped_blocks_total.inc_by(snapshot.blocks_skipped);

        self.residual_mse.set(snapshot.residual_mse);
        // A perfect prediction has no finite PSNR; leave the previous value.
        if let Some(psnr) = snapshot.residual_psnr_db {
            self.residual_psnr_db.set(psnr);
        }
        self.mean_vector_magnitude
            .set(snapshot.mean_vector_magnitude);
        self.reconstruction_exact
            .set(if snapshot.reconstruction_exact { 1 } else { 0 });
        self.estimation_seconds.set(snapshot.estimation_seconds);
    }

    /// Records a pipeline report.
    pub fn record_report(&self, report: &PipelineReport) {
        self.record(&MetricsSnapshot::from(report));
    }

    /// Number of runs recorded so far.
    pub fn runs(&self) -> u64 {
        self.runs_total.get()
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
