//! Residual computation and reconstruction.

use crate::capture::{Frame, SignedFrame};
use crate::error::MotionError;

fn check_dimensions(
    left: (u32, u32),
    right: (u32, u32),
    left_len: usize,
    right_len: usize,
) -> Result<(), MotionError> {
    if left != right || left_len != right_len {
        return Err(MotionError::DimensionMismatch {
            left_width: left.0,
            left_height: left.1,
            right_width: right.0,
            right_height: right.1,
        });
    }
    Ok(())
}

/// Computes `target - predicted` with signed arithmetic.
pub fn compute_residual(target: &Frame, predicted: &Frame) -> Result<SignedFrame, MotionError> {
    check_dimensions(
        (target.width(), target.height()),
        (predicted.width(), predicted.height()),
        target.pixels().len(),
        predicted.pixels().len(),
    )?;

    let samples = target
        .pixels()
        .iter()
        .zip(predicted.pixels())
        .map(|(&t, &p)| t as i16 - p as i16)
        .collect();

    Ok(SignedFrame::new(samples, target.width(), target.height()))
}

/// Computes `predicted + residual`.
///
/// Exact for residuals from [`compute_residual`]. A residual from
/// elsewhere that would leave the 8-bit range is saturated to `[0, 255]`.
pub fn reconstruct(predicted: &Frame, residual: &SignedFrame) -> Result<Frame, MotionError> {
    check_dimensions(
        (predicted.width(), predicted.height()),
        (residual.width(), residual.height()),
        predicted.pixels().len(),
        residual.samples().len(),
    )?;

    let pixels = predicted
        .pixels()
        .iter()
        .zip(residual.samples())
        .map(|(&p, &r)| (p as i32 + r as i32).clamp(0, 255) as u8)
        .collect();

    Ok(Frame::new(
        pixels,
        predicted.width(),
        predicted.height(),
        predicted.sequence(),
    ))
}

/// Returns true if `predicted + residual` equals `target` without saturating.
pub fn reconstructs_exactly(target: &Frame, predicted: &Frame, residual: &SignedFrame) -> bool {
    target.same_dimensions(predicted)
        && target.pixels().len() == residual.samples().len()
        && target
            .pixels()
            .iter()
            .zip(predicted.pixels())
            .zip(residual.samples())
            .all(|((&t, &p), &r)| p as i32 + r as i32 == t as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residual_keeps_sign() {
        let target = Frame::new(vec![0, 255, 10, 200], 2, 2, 0);
        let predicted = Frame::new(vec![255, 0, 10, 100], 2, 2, 0);

        let residual = compute_residual(&target, &predicted).unwrap();
        assert_eq!(residual.samples(), &[-255, 255, 0, 100]);
    }

    #[test]
    fn test_reconstruction_identity() {
        let target = Frame::from_fn(7, 5, |x, y| (x * 40 + y * 3) as u8);
        let predicted = Frame::from_fn(7, 5, |x, y| (255 - x * 31 - y) as u8);

        let residual = compute_residual(&target, &predicted).unwrap();
        let rebuilt = reconstruct(&predicted, &residual).unwrap();
        assert_eq!(rebuilt, target);
        assert!(reconstructs_exactly(&target, &predicted, &residual));
    }

    #[test]
    fn test_zero_prediction_residual_is_target() {
        let target = Frame::from_fn(4, 4, |x, y| (x + y) as u8);
        let residual = compute_residual(&target, &Frame::zeroed(4, 4)).unwrap();
        assert_eq!(residual.get(3, 3), 6);
    }

    #[test]
    fn test_foreign_residual_saturates() {
        let predicted = Frame::new(vec![250, 5], 2, 1, 0);
        let residual = SignedFrame::new(vec![100, -100], 2, 1);
        let rebuilt = reconstruct(&predicted, &residual).unwrap();
        assert_eq!(rebuilt.pixels(), &[255, 0]);
    }

    #[test]
    fn test_extreme_residual_saturates() {
        let predicted = Frame::new(vec![10, 200, 255, 0], 4, 1, 0);
        let residual = SignedFrame::new(vec![i16::MAX, i16::MIN, i16::MAX, i16::MIN], 4, 1);

        let rebuilt = reconstruct(&predicted, &residual).unwrap();
        assert_eq!(rebuilt.pixels(), &[255, 0, 255, 0]);

        let target = Frame::new(vec![255, 0, 255, 0], 4, 1, 0);
        assert!(!reconstructs_exactly(&target, &predicted, &residual));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Frame::zeroed(4, 4);
        let b = Frame::zeroed(4, 2);
        assert!(matches!(
            compute_residual(&a, &b),
            Err(MotionError::DimensionMismatch { .. })
        ));

        let residual = SignedFrame::new(vec![0; 8], 2, 4);
        assert!(matches!(
            reconstruct(&a, &residual),
            Err(MotionError::DimensionMismatch { .. })
        ));
    }
}
