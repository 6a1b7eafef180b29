//! Block Motion Library
//!
//! Block-based motion estimation and compensation for 8-bit grayscale
//! frames. A target frame is tiled into square blocks, each block is
//! matched against a window of the reference frame, and the winning
//! displacements form a motion field. The field drives a predicted frame,
//! and the signed residual between target and prediction reconstructs the
//! target exactly.
//!
//! # Architecture
//!
//! ```text
//! capture → estimation → prediction → residual
//!                ↓            ↓           ↓
//!                  analysis / metrics
//! ```
//!
//! # Determinism
//!
//! Candidates are visited with the vertical offset in the outer loop and
//! the horizontal offset in the inner loop, both ascending. Only a strictly
//! lower cost replaces the current best, so ties go to the first candidate
//! visited. Block results are collected by index, so the field is identical
//! for any thread count.
//!
//! # Example
//!
//! ```no_run
//! use block_motion::{
//!     compute_residual, estimate_motion, predict_frame, reconstruct,
//!     BoundaryPolicy, Frame,
//! };
//!
//! let reference = Frame::from_fn(64, 64, |x, y| ((x * 7) ^ (y * 13)) as u8);
//! let target = Frame::from_fn(64, 64, |x, y| ((x.saturating_sub(2) * 7) ^ (y * 13)) as u8);
//!
//! let field = estimate_motion(&reference, &target, 16, 8).unwrap();
//! let predicted = predict_frame(&reference, &field, 16, BoundaryPolicy::ClampAndPad).unwrap();
//! let residual = compute_residual(&target, &predicted).unwrap();
//!
//! assert_eq!(reconstruct(&predicted, &residual).unwrap(), target);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod error;
pub mod estimation;
pub mod metrics;
pub mod pipeline;
pub mod prediction;
pub mod residual;

// Re-export commonly used types at crate root
pub use analysis::{FieldStatistics, ResidualStatistics};
pub use capture::{FileConfig, Frame, FrameSource, SignedFrame, SourceConfig, SyntheticSource};
pub use error::{MotionError, ParameterError};
pub use estimation::{
    estimate_motion, CostMetric, MotionEstimator, MotionField, MotionVector, SearchParams,
    SearchStrategy,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput, PipelineReport};
pub use prediction::{predict_frame, BoundaryPolicy, FramePredictor};
pub use residual::{compute_residual, reconstruct};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
