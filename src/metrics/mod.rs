//! Prometheus metrics for the motion pipeline.
//!
//! # Metrics Exposed
//!
//! ## Estimation
//! - `block_motion_runs_total` - Frame pairs processed
//! - `block_motion_blocks_total` - Blocks searched
//! - `block_motion_candidates_visited_total` - Candidate displacements visited
//! - `block_motion_candidates_evaluated_total` - Candidates inside the reference frame
//! - `block_motion_fallback_blocks_total` - Blocks with no valid candidate
//! - `block_motion_estimation_seconds` - Wall time of the last estimation
//!
//! ## Prediction
//! - `block_motion_predicted_blocks_total` - Blocks written by the predictor
//! - `block_motion_skipped_blocks_total` - Blocks left zero by the boundary policy
//!
//! ## Residual
//! - `block_motion_residual_mse` - Mean squared residual of the last run
//! - `block_motion_residual_psnr_db` - Residual PSNR of the last run
//! - `block_motion_mean_vector_magnitude` - Mean vector length of the last run
//! - `block_motion_reconstruction_exact` - 1 if the last reconstruction was exact
//!
//! With the `metrics` feature, [`MetricsServer`] serves them over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use block_motion::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! registry.record(&MetricsSnapshot {
//!     blocks: 4,
//!     candidates_visited: 1156,
//!     candidates_evaluated: 324,
//!     reconstruction_exact: true,
//!     ..Default::default()
//! });
//!
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
