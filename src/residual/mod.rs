//! Prediction residuals and reconstruction.
//!
//! The residual keeps the exact signed difference between the target and
//! the prediction, so adding it back to the prediction reproduces the
//! target bit for bit.

mod compute;

pub use compute::{compute_residual, reconstruct, reconstructs_exactly};
