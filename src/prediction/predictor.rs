//! Motion-compensated frame prediction.

use super::BoundaryPolicy;
use crate::capture::Frame;
use crate::error::{MotionError, ParameterError};
use crate::estimation::{MotionField, MotionVector};

/// A predicted frame and how many blocks contributed to it.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// The predicted frame, zero wherever no block was written.
    pub frame: Frame,
    /// Blocks copied from the reference frame.
    pub blocks_written: usize,
    /// Blocks left as zero by the boundary policy.
    pub blocks_skipped: usize,
}

/// Builds predicted frames from a reference frame and a motion field.
///
/// Both boundary policies share validation and the block walk; only the
/// per-block copy differs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FramePredictor {
    policy: BoundaryPolicy,
}

impl FramePredictor {
    /// Creates a predictor with the given boundary policy.
    pub fn new(policy: BoundaryPolicy) -> Self {
        Self { policy }
    }

    /// Returns the boundary policy.
    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    /// Checks that `field` was computed for `reference` with `block_size`.
    pub fn validate(
        &self,
        reference: &Frame,
        field: &MotionField,
        block_size: u32,
    ) -> Result<(), ParameterError> {
        reference.check()?;
        if block_size == 0 {
            return Err(ParameterError::ZeroBlockSize);
        }
        if block_size != field.block_size() {
            return Err(ParameterError::BlockSizeMismatch {
                field: field.block_size(),
                requested: block_size,
            });
        }
        if field.width() != reference.width() || field.height() != reference.height() {
            return Err(ParameterError::FieldMismatch {
                field_width: field.width(),
                field_height: field.height(),
                frame_width: reference.width(),
                frame_height: reference.height(),
            });
        }
        if block_size > reference.width() || block_size > reference.height() {
            return Err(ParameterError::BlockExceedsFrame {
                block_size,
                width: reference.width(),
                height: reference.height(),
            });
        }
        Ok(())
    }

    /// Predicts the target frame by copying displaced reference blocks.
    pub fn predict(
        &self,
        reference: &Frame,
        field: &MotionField,
        block_size: u32,
    ) -> Result<Prediction, MotionError> {
        self.validate(reference, field, block_size)?;

        let mut frame = Frame::zeroed(reference.width(), reference.height());
        let mut scratch = vec![0u8; (block_size as usize) * (block_size as usize)];
        let mut blocks_written = 0;
        let mut blocks_skipped = 0;

        for mv in field {
            let written = match self.policy {
                BoundaryPolicy::RejectAtEdge => copy_in_frame(reference, mv, block_size, &mut frame),
                BoundaryPolicy::ClampAndPad => {
                    copy_clamped(reference, mv, block_size, &mut frame, &mut scratch)
                }
            };
            if written {
                blocks_written += 1;
            } else {
                blocks_skipped += 1;
            }
        }

        if blocks_skipped > 0 {
            tracing::debug!(
                policy = %self.policy,
                blocks_written,
                blocks_skipped,
                "Prediction left blocks unwritten"
            );
        }

        Ok(Prediction {
            frame,
            blocks_written,
            blocks_skipped,
        })
    }
}

/// Copies the block only when source and destination are fully inside.
fn copy_in_frame(reference: &Frame, mv: &MotionVector, block_size: u32, out: &mut Frame) -> bool {
    let (src_x, src_y) = mv.destination();
    if !reference.contains_block(mv.x as i64, mv.y as i64, block_size)
        || !reference.contains_block(src_x, src_y, block_size)
    {
        return false;
    }

    for row in 0..block_size {
        let src = reference.row(src_x as u32, src_y as u32 + row, block_size);
        out.row_mut(mv.x, mv.y + row, block_size)
            .copy_from_slice(src);
    }
    true
}

/// Clamps the source per axis and pads the unavailable part with zeros.
///
/// A block whose own origin cannot hold a full block is skipped.
fn copy_clamped(
    reference: &Frame,
    mv: &MotionVector,
    block_size: u32,
    out: &mut Frame,
    scratch: &mut [u8],
) -> bool {
    let (width, height) = (reference.width(), reference.height());
    if !reference.contains_block(mv.x as i64, mv.y as i64, block_size) {
        return false;
    }

    let (raw_x, raw_y) = mv.destination();
    let src_x = raw_x.clamp(0, (width - block_size) as i64) as u32;
    let src_y = raw_y.clamp(0, (height - block_size) as i64) as u32;

    // Whatever part of the source block exists goes top-left into a zeroed block.
    let bs = block_size as usize;
    scratch.fill(0);
    let avail_w = block_size.min(width - src_x);
    let avail_h = block_size.min(height - src_y);
    for row in 0..avail_h {
        let start = row as usize * bs;
        scratch[start..start + avail_w as usize]
            .copy_from_slice(reference.row(src_x, src_y + row, avail_w));
    }

    // Written back truncated to the part of the target block inside the frame.
    let out_w = (mv.x + block_size).min(width) - mv.x;
    let out_h = (mv.y + block_size).min(height) - mv.y;
    for row in 0..out_h {
        let start = row as usize * bs;
        out.row_mut(mv.x, mv.y + row, out_w)
            .copy_from_slice(&scratch[start..start + out_w as usize]);
    }
    true
}

/// Predicts a frame from `reference` and `field` under `policy`.
pub fn predict_frame(
    reference: &Frame,
    field: &MotionField,
    block_size: u32,
    policy: BoundaryPolicy,
) -> Result<Frame, MotionError> {
    FramePredictor::new(policy)
        .predict(reference, field, block_size)
        .map(|prediction| prediction.frame)
}
