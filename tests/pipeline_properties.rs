//! Property-based tests for estimation, prediction and reconstruction.
//!
//! Frames come from the synthetic source so that every generated texture
//! has enough detail for block matching to be unambiguous.

use block_motion::capture::{Frame, FrameSource, SourceConfig, SyntheticSource};
use block_motion::estimation::{block_origins, MotionEstimator, SearchParams, SearchStrategy};
use block_motion::prediction::{BoundaryPolicy, FramePredictor};
use block_motion::residual::{compute_residual, reconstruct};
use block_motion::{estimate_motion, predict_frame};
use proptest::prelude::*;

fn frame_pair(width: u32, height: u32, seed: u64, pan_x: i32, pan_y: i32) -> (Frame, Frame) {
    let config = SourceConfig {
        width,
        height,
        seed,
        pan_x,
        pan_y,
        ..Default::default()
    };
    let mut source = SyntheticSource::with_config(&config).unwrap();
    let reference = source.next_frame().unwrap();
    let target = source.next_frame().unwrap();
    (reference, target)
}

/// Block size and frame dimensions that are whole multiples of it.
fn tiled_geometry() -> impl Strategy<Value = (u32, u32, u32)> {
    prop_oneof![Just(4u32), Just(8u32), Just(16u32)]
        .prop_flat_map(|bs| (Just(bs), 1u32..=4, 1u32..=4))
        .prop_map(|(bs, bx, by)| (bs, bx * bs, by * bs))
}

/// Block size and arbitrary dimensions no smaller than it.
fn ragged_geometry() -> impl Strategy<Value = (u32, u32, u32)> {
    prop_oneof![Just(4u32), Just(8u32)]
        .prop_flat_map(|bs| (Just(bs), bs..=40, bs..=40))
}

fn pan() -> impl Strategy<Value = (i32, i32)> {
    (-3i32..=3, -3i32..=3)
}

// =============================================================================
// Estimation
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Repeated runs and different thread counts give the same field.
    #[test]
    fn estimation_is_deterministic(
        (bs, width, height) in ragged_geometry(),
        seed in any::<u64>(),
        (pan_x, pan_y) in pan(),
        range in 0i32..=4,
    ) {
        prop_assume!(pan_x.unsigned_abs() < width && pan_y.unsigned_abs() < height);
        let (reference, target) = frame_pair(width, height, seed, pan_x, pan_y);

        let baseline = estimate_motion(&reference, &target, bs, range).unwrap();
        let again = estimate_motion(&reference, &target, bs, range).unwrap();
        prop_assert_eq!(&baseline, &again);

        for threads in [1usize, 2, 3] {
            let estimator = MotionEstimator::new(SearchParams::new(bs, range).with_threads(threads));
            let field = estimator.estimate(&reference, &target).unwrap().field;
            prop_assert_eq!(&baseline, &field);
        }
    }

    /// Vectors come out in raster order, one per tile, within the range.
    #[test]
    fn field_is_raster_ordered(
        (bs, width, height) in ragged_geometry(),
        seed in any::<u64>(),
        range in 0i32..=3,
    ) {
        let (reference, target) = frame_pair(width, height, seed, 1, 1);
        let field = estimate_motion(&reference, &target, bs, range).unwrap();

        let origins: Vec<(u32, u32)> = field.iter().map(|mv| (mv.x, mv.y)).collect();
        let expected: Vec<(u32, u32)> = block_origins(width, height, bs).collect();
        prop_assert_eq!(origins, expected);
        prop_assert_eq!(field.len(), (field.blocks_x() * field.blocks_y()) as usize);

        for mv in field.iter() {
            prop_assert!(mv.dx.abs() <= range && mv.dy.abs() <= range);
            let (sx, sy) = mv.destination();
            prop_assert!(mv.is_zero() || reference.contains_block(sx, sy, bs));
        }
    }

    /// Diamond search only lands on source blocks inside the reference.
    #[test]
    fn diamond_field_has_valid_vectors(
        (bs, width, height) in tiled_geometry(),
        seed in any::<u64>(),
        (pan_x, pan_y) in pan(),
    ) {
        prop_assume!(pan_x.unsigned_abs() < width && pan_y.unsigned_abs() < height);
        let (reference, target) = frame_pair(width, height, seed, pan_x, pan_y);
        let params = SearchParams::new(bs, 4).with_strategy(SearchStrategy::Diamond);
        let estimate = MotionEstimator::new(params).estimate(&reference, &target).unwrap();

        prop_assert_eq!(estimate.field.len(), estimate.stats.blocks);
        for mv in estimate.field.iter() {
            let (sx, sy) = mv.destination();
            prop_assert!(reference.contains_block(sx, sy, bs));
        }
    }
}

// =============================================================================
// Prediction and reconstruction
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Identical frames yield a zero field, an exact prediction and no residual.
    #[test]
    fn zero_motion_identity(
        (bs, width, height) in tiled_geometry(),
        seed in any::<u64>(),
        range in 0i32..=4,
    ) {
        let (frame, _) = frame_pair(width, height, seed, 0, 0);
        let field = estimate_motion(&frame, &frame, bs, range).unwrap();
        prop_assert!(field.iter().all(|mv| mv.is_zero()));

        for policy in BoundaryPolicy::ALL {
            let predicted = predict_frame(&frame, &field, bs, policy).unwrap();
            prop_assert_eq!(&predicted, &frame);
            prop_assert!(compute_residual(&frame, &predicted).unwrap().is_zero());
        }
    }

    /// Prediction plus residual gives back the target for any two frames.
    #[test]
    fn reconstruction_identity(
        (width, height) in (1u32..=24, 1u32..=24),
        seed in any::<u64>(),
    ) {
        let len = (width * height) as usize;
        let target = Frame::from_fn(width, height, |x, y| {
            (seed.rotate_left(x + 7 * y) as u8) ^ (x as u8).wrapping_mul(31)
        });
        let predicted = Frame::from_fn(width, height, |x, y| {
            (seed.rotate_right(y + 3 * x) >> 8) as u8
        });
        prop_assert_eq!(target.pixel_count(), len);

        let residual = compute_residual(&target, &predicted).unwrap();
        prop_assert_eq!(reconstruct(&predicted, &residual).unwrap(), target);
    }

    /// Clamp-and-pad writes every tile from a full block of the reference.
    #[test]
    fn clamp_and_pad_covers_tiled_frame(
        (bs, width, height) in tiled_geometry(),
        seed in any::<u64>(),
        (pan_x, pan_y) in pan(),
        range in 0i32..=4,
    ) {
        prop_assume!(pan_x.unsigned_abs() < width && pan_y.unsigned_abs() < height);
        let (reference, target) = frame_pair(width, height, seed, pan_x, pan_y);
        let field = estimate_motion(&reference, &target, bs, range).unwrap();

        let prediction = FramePredictor::new(BoundaryPolicy::ClampAndPad)
            .predict(&reference, &field, bs)
            .unwrap();
        prop_assert_eq!(prediction.blocks_skipped, 0);
        prop_assert_eq!(prediction.blocks_written, field.len());

        for mv in field.iter() {
            let (sx, sy) = mv.destination();
            let sx = sx.clamp(0, (width - bs) as i64) as u32;
            let sy = sy.clamp(0, (height - bs) as i64) as u32;
            for row in 0..bs {
                prop_assert_eq!(
                    prediction.frame.row(mv.x, mv.y + row, bs),
                    reference.row(sx, sy + row, bs)
                );
            }
        }
    }

    /// Reject-at-edge either copies a block exactly or leaves it zero.
    #[test]
    fn reject_at_edge_copies_or_skips(
        (bs, width, height) in ragged_geometry(),
        seed in any::<u64>(),
        (pan_x, pan_y) in pan(),
    ) {
        prop_assume!(pan_x.unsigned_abs() < width && pan_y.unsigned_abs() < height);
        let (reference, target) = frame_pair(width, height, seed, pan_x, pan_y);
        let field = estimate_motion(&reference, &target, bs, 3).unwrap();

        let prediction = FramePredictor::new(BoundaryPolicy::RejectAtEdge)
            .predict(&reference, &field, bs)
            .unwrap();
        prop_assert_eq!(prediction.blocks_written + prediction.blocks_skipped, field.len());

        for mv in field.iter() {
            let (tw, th) = reference.tile_extent(mv.x, mv.y, bs);
            let (sx, sy) = mv.destination();
            let copied = tw == bs && th == bs && reference.contains_block(sx, sy, bs);
            for row in 0..th {
                let written = prediction.frame.row(mv.x, mv.y + row, tw);
                if copied {
                    prop_assert_eq!(written, reference.row(sx as u32, sy as u32 + row, bs));
                } else {
                    prop_assert!(written.iter().all(|&p| p == 0));
                }
            }
        }

        let residual = compute_residual(&target, &prediction.frame).unwrap();
        prop_assert_eq!(reconstruct(&prediction.frame, &residual).unwrap(), target);
    }
}
