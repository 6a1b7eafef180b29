//! Motion compensation.
//!
//! Turns a reference frame and a motion field into a predicted frame.
//! The boundary policy is a parameter of one predictor rather than two
//! separate implementations.

mod policy;
mod predictor;

pub use policy::BoundaryPolicy;
pub use predictor::{predict_frame, FramePredictor, Prediction};
