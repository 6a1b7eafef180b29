//! Error taxonomy for estimation, prediction and residual stages.
//!
//! Parameter problems are detected before any computation starts.
//! Partial edge blocks and out-of-frame candidates are not errors.

use thiserror::Error;

/// Malformed or inconsistent parameters passed to a core operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// Block size of zero.
    #[error("block size must be positive")]
    ZeroBlockSize,

    /// Search range below zero.
    #[error("search range must be non-negative, got {0}")]
    NegativeSearchRange(i32),

    /// Sample count disagrees with the dimensions, or a dimension is zero.
    #[error("frame {width}x{height} holds {len} samples")]
    MalformedFrame {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Samples actually held.
        len: usize,
    },

    /// Block does not fit in the frame.
    #[error("block size {block_size} exceeds frame dimensions {width}x{height}")]
    BlockExceedsFrame {
        /// Requested block size.
        block_size: u32,
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
    },

    /// Reference and target differ in size.
    #[error("reference frame is {reference_width}x{reference_height}, target is {target_width}x{target_height}")]
    FrameSizeMismatch {
        /// Reference width.
        reference_width: u32,
        /// Reference height.
        reference_height: u32,
        /// Target width.
        target_width: u32,
        /// Target height.
        target_height: u32,
    },

    /// Motion field was estimated for a frame of another size.
    #[error("motion field was computed for {field_width}x{field_height}, reference is {frame_width}x{frame_height}")]
    FieldMismatch {
        /// Width the field covers.
        field_width: u32,
        /// Height the field covers.
        field_height: u32,
        /// Reference width.
        frame_width: u32,
        /// Reference height.
        frame_height: u32,
    },

    /// Prediction block size differs from the field's.
    #[error("motion field uses block size {field}, prediction requested {requested}")]
    BlockSizeMismatch {
        /// Block size of the field.
        field: u32,
        /// Block size asked for.
        requested: u32,
    },
}

/// Errors returned by the motion pipeline.
#[derive(Debug, Error)]
pub enum MotionError {
    /// Parameters rejected before any work started.
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParameterError),

    /// Residual operands differ in size.
    #[error("dimension mismatch: {left_width}x{left_height} vs {right_width}x{right_height}")]
    DimensionMismatch {
        /// Width of the first operand.
        left_width: u32,
        /// Height of the first operand.
        left_height: u32,
        /// Width of the second operand.
        right_width: u32,
        /// Height of the second operand.
        right_height: u32,
    },

    /// The cancel flag was set during estimation.
    #[error("estimation cancelled after {completed} of {total} blocks")]
    Cancelled {
        /// Blocks searched before stopping.
        completed: usize,
        /// Blocks in the field.
        total: usize,
    },

    /// The dedicated rayon pool could not be built.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl MotionError {
    /// Returns true for errors caused by caller-supplied parameters.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, MotionError::InvalidParameter(_))
    }
}
